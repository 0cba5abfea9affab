//! Typed calls over the operation catalogue.
//!
//! Each request struct names its [`Operation`] and its response type, and is
//! marked either [`ReadCall`] or [`WriteCall`]. The query client only accepts
//! reads in `fetch` and writes in `submit`, so a screen cannot cache a write
//! or skip invalidation on a read by accident.
//!
//! Reads decode the bare payload into `Output`. Writes decode the `data`
//! field of the envelope into `Output`.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::entities::*;
use crate::error::ValidationError;
use crate::money::{validate_amount, validate_currency, validate_rate, Money};
use crate::operation::Operation;

/// A typed request for one operation.
pub trait Call: Serialize + Send + Sync {
    /// Operation this request is sent as.
    const OPERATION: Operation;

    /// Response payload type.
    type Output: DeserializeOwned + Send;

    /// Reject malformed input before it crosses the boundary.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Marker for cacheable reads.
pub trait ReadCall: Call {}

/// Marker for invalidating writes.
pub trait WriteCall: Call {}

/// Implement [`Call`] plus the read/write marker for a request struct.
#[macro_export]
macro_rules! impl_call {
    (read $type:ty => $op:ident, $output:ty) => {
        impl $crate::calls::Call for $type {
            const OPERATION: $crate::operation::Operation = $crate::operation::Operation::$op;
            type Output = $output;
        }
        impl $crate::calls::ReadCall for $type {}
    };
    (write $type:ty => $op:ident, $output:ty) => {
        impl $crate::calls::Call for $type {
            const OPERATION: $crate::operation::Operation = $crate::operation::Operation::$op;
            type Output = $output;
        }
        impl $crate::calls::WriteCall for $type {}
    };
    (write $type:ty => $op:ident, $output:ty, validate = $check:path) => {
        impl $crate::calls::Call for $type {
            const OPERATION: $crate::operation::Operation = $crate::operation::Operation::$op;
            type Output = $output;

            fn validate(&self) -> Result<(), $crate::error::ValidationError> {
                $check(self)
            }
        }
        impl $crate::calls::WriteCall for $type {}
    };
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

fn positive_quantity(field: &str, value: i64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be greater than zero".to_string(),
        })
    }
}

// ============================================================================
// AUTH
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetSession {}
impl_call!(read GetSession => AuthSession, Option<Session>);

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}
impl_call!(write Login => AuthLogin, Session, validate = Login::check);

impl Login {
    fn check(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Logout {}
impl_call!(write Logout => AuthLogout, Value);

// ============================================================================
// ACCOUNTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
}
impl_call!(read ListAccounts => AccountsList, Vec<Account>);

#[derive(Debug, Clone, Serialize)]
pub struct GetAccount {
    pub id: String,
}
impl_call!(read GetAccount => AccountsGet, Option<Account>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountStatement {
    pub account_id: String,
}
impl_call!(read GetAccountStatement => AccountsStatement, Option<AccountStatement>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<String>,
}
impl_call!(write CreateAccount => AccountsCreate, Account, validate = CreateAccount::check);

impl CreateAccount {
    fn check(&self) -> Result<(), ValidationError> {
        require("code", &self.code)?;
        require("name", &self.name)?;
        validate_currency("currency", &self.currency)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
impl_call!(write UpdateAccount => AccountsUpdate, Account, validate = UpdateAccount::check);

impl UpdateAccount {
    fn check(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        match &self.name {
            Some(name) => require("name", name),
            None => Ok(()),
        }
    }
}

// ============================================================================
// ORDERS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}
impl_call!(read ListOrders => OrdersList, Vec<Order>);

#[derive(Debug, Clone, Serialize)]
pub struct GetOrder {
    pub id: String,
}
impl_call!(read GetOrder => OrdersGet, Option<Order>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub account_id: String,
    pub currency: String,
    pub lines: Vec<OrderLine>,
}
impl_call!(write CreateOrder => OrdersCreate, Order, validate = CreateOrder::check);

impl CreateOrder {
    fn check(&self) -> Result<(), ValidationError> {
        require("accountId", &self.account_id)?;
        validate_currency("currency", &self.currency)?;
        if self.lines.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "lines".to_string(),
            });
        }
        for line in &self.lines {
            require("lines.productId", &line.product_id)?;
            positive_quantity("lines.quantity", line.quantity)?;
            if !line.unit_price.is_positive() {
                return Err(ValidationError::InvalidAmount {
                    field: "lines.unitPrice".to_string(),
                    value: line.unit_price.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrderStatus {
    pub id: String,
    pub status: OrderStatus,
}
impl_call!(write UpdateOrderStatus => OrdersUpdateStatus, Order, validate = UpdateOrderStatus::check);

impl UpdateOrderStatus {
    fn check(&self) -> Result<(), ValidationError> {
        require("id", &self.id)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLedger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}
impl_call!(read ListLedger => LedgerList, Vec<LedgerEntry>);

/// Money received from (collection) or paid to (payment) an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPosting {
    pub account_id: String,
    pub amount: String,
    pub currency: String,
    pub exchange_rate: String,
    pub description: String,
}

impl LedgerPosting {
    fn check(&self) -> Result<(), ValidationError> {
        require("accountId", &self.account_id)?;
        validate_amount("amount", &self.amount)?;
        validate_currency("currency", &self.currency)?;
        validate_rate("exchangeRate", &self.exchange_rate)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RecordCollection(pub LedgerPosting);
impl_call!(write RecordCollection => LedgerCollection, LedgerEntry, validate = RecordCollection::check);

impl RecordCollection {
    fn check(&self) -> Result<(), ValidationError> {
        self.0.check()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RecordLedgerPayment(pub LedgerPosting);
impl_call!(write RecordLedgerPayment => LedgerPayment, LedgerEntry, validate = RecordLedgerPayment::check);

impl RecordLedgerPayment {
    fn check(&self) -> Result<(), ValidationError> {
        self.0.check()
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProducts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
}
impl_call!(read ListProducts => ProductsList, Vec<Product>);

#[derive(Debug, Clone, Serialize)]
pub struct GetProduct {
    pub id: String,
}
impl_call!(read GetProduct => ProductsGet, Option<Product>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBom {
    pub product_id: String,
}
impl_call!(read GetBom => ProductsBom, Option<BillOfMaterials>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub code: String,
    pub name: String,
    pub category: ProductCategory,
    pub unit: String,
    pub unit_price: String,
    pub cost_price: String,
    pub currency: String,
}
impl_call!(write CreateProduct => ProductsCreate, Product, validate = CreateProduct::check);

impl CreateProduct {
    fn check(&self) -> Result<(), ValidationError> {
        require("code", &self.code)?;
        require("name", &self.name)?;
        require("unit", &self.unit)?;
        validate_currency("currency", &self.currency)?;
        let price = validate_amount("unitPrice", &self.unit_price)?;
        let cost = validate_amount("costPrice", &self.cost_price)?;
        margin_guard(price, cost)
    }
}

/// Refuse a sale price below cost.
fn margin_guard(price: Money, cost: Money) -> Result<(), ValidationError> {
    if price < cost {
        Err(ValidationError::InvalidValue {
            field: "unitPrice".to_string(),
            reason: format!("{} is below cost {}", price, cost),
        })
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<String>,
}
impl_call!(write UpdateProduct => ProductsUpdate, Product, validate = UpdateProduct::check);

impl UpdateProduct {
    fn check(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        let price = self
            .unit_price
            .as_deref()
            .map(|p| validate_amount("unitPrice", p))
            .transpose()?;
        let cost = self
            .cost_price
            .as_deref()
            .map(|c| validate_amount("costPrice", c))
            .transpose()?;
        match (price, cost) {
            (Some(price), Some(cost)) => margin_guard(price, cost),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// INVENTORY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}
impl_call!(read ListStock => InventoryList, Vec<StockItem>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListWarehouses {}
impl_call!(read ListWarehouses => InventoryWarehouses, Vec<Warehouse>);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMovements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}
impl_call!(read ListMovements => InventoryMovements, Vec<StockMovement>);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkOrders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkOrderStatus>,
}
impl_call!(read ListWorkOrders => InventoryWorkOrders, Vec<WorkOrder>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStock {
    pub product_id: String,
    pub warehouse_id: String,
    /// Signed change to the on-hand quantity.
    pub quantity_delta: i64,
    pub reason: String,
}
impl_call!(write AdjustStock => InventoryAdjust, StockItem, validate = AdjustStock::check);

impl AdjustStock {
    fn check(&self) -> Result<(), ValidationError> {
        require("productId", &self.product_id)?;
        require("warehouseId", &self.warehouse_id)?;
        require("reason", &self.reason)?;
        if self.quantity_delta == 0 {
            return Err(ValidationError::InvalidValue {
                field: "quantityDelta".to_string(),
                reason: "must not be zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrder {
    pub product_id: String,
    pub quantity: i64,
    pub due_date: NaiveDate,
}
impl_call!(write CreateWorkOrder => InventoryCreateWorkOrder, WorkOrder, validate = CreateWorkOrder::check);

impl CreateWorkOrder {
    fn check(&self) -> Result<(), ValidationError> {
        require("productId", &self.product_id)?;
        positive_quantity("quantity", self.quantity)
    }
}

// ============================================================================
// INVOICES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}
impl_call!(read ListInvoices => InvoicesList, Vec<Invoice>);

#[derive(Debug, Clone, Serialize)]
pub struct GetInvoice {
    pub id: String,
}
impl_call!(read GetInvoice => InvoicesGet, Option<Invoice>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub currency: String,
    pub subtotal: String,
    pub tax: String,
}
impl_call!(write CreateInvoice => InvoicesCreate, Invoice, validate = CreateInvoice::check);

impl CreateInvoice {
    fn check(&self) -> Result<(), ValidationError> {
        require("accountId", &self.account_id)?;
        validate_currency("currency", &self.currency)?;
        validate_amount("subtotal", &self.subtotal)?;
        let tax: Money = self
            .tax
            .parse()
            .map_err(|e: crate::money::DecimalError| ValidationError::InvalidAmount {
                field: "tax".to_string(),
                value: self.tax.clone(),
                reason: e.to_string(),
            })?;
        if tax < Money::ZERO {
            return Err(ValidationError::InvalidAmount {
                field: "tax".to_string(),
                value: self.tax.clone(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// PRICING
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPrices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_list: Option<String>,
}
impl_call!(read ListPrices => PricingList, Vec<PriceListEntry>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCommissionRules {}
impl_call!(read ListCommissionRules => PricingCommissionRules, Vec<CommissionRule>);

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePrice {
    pub id: String,
    pub price: String,
}
impl_call!(write UpdatePrice => PricingUpdate, PriceListEntry, validate = UpdatePrice::check);

impl UpdatePrice {
    fn check(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        validate_amount("price", &self.price).map(|_| ())
    }
}

// ============================================================================
// FINANCE
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCheques {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChequeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChequeKind>,
}
impl_call!(read ListCheques => FinanceCheques, Vec<Cheque>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetChartOfAccounts {}
impl_call!(read GetChartOfAccounts => FinanceChartOfAccounts, Vec<LedgerAccount>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheque {
    pub kind: ChequeKind,
    pub number: String,
    pub drawer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    pub account_id: String,
    pub amount: String,
    pub currency: String,
    pub due_date: NaiveDate,
}
impl_call!(write CreateCheque => FinanceCreateCheque, Cheque, validate = CreateCheque::check);

impl CreateCheque {
    fn check(&self) -> Result<(), ValidationError> {
        require("number", &self.number)?;
        require("drawer", &self.drawer)?;
        require("accountId", &self.account_id)?;
        validate_amount("amount", &self.amount)?;
        validate_currency("currency", &self.currency)?;
        if self.kind == ChequeKind::Cheque && self.bank.as_deref().unwrap_or("").is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "bank".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateChequeStatus {
    pub id: String,
    pub status: ChequeStatus,
}
impl_call!(write UpdateChequeStatus => FinanceUpdateChequeStatus, Cheque, validate = UpdateChequeStatus::check);

impl UpdateChequeStatus {
    fn check(&self) -> Result<(), ValidationError> {
        require("id", &self.id)
    }
}

// ============================================================================
// ANALYTICS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetDashboard {}
impl_call!(read GetDashboard => AnalyticsDashboard, DashboardSummary);

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetSalesByMonth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}
impl_call!(read GetSalesByMonth => AnalyticsSalesByMonth, Vec<MonthlySales>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetTopProducts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
impl_call!(read GetTopProducts => AnalyticsTopProducts, Vec<TopProduct>);

// ============================================================================
// CASH AND PAYMENTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<CashDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}
impl_call!(read ListCash => CashList, Vec<CashEntry>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetCashBalance {}
impl_call!(read GetCashBalance => CashBalance, Vec<CashBalance>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCashEntry {
    pub direction: CashDirection,
    pub amount: String,
    pub currency: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}
impl_call!(write RecordCashEntry => CashEntry, CashEntry, validate = RecordCashEntry::check);

impl RecordCashEntry {
    fn check(&self) -> Result<(), ValidationError> {
        validate_amount("amount", &self.amount)?;
        validate_currency("currency", &self.currency)?;
        require("description", &self.description)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
}
impl_call!(read ListPayments => PaymentsList, Vec<Payment>);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
    pub account_id: String,
    pub method: PaymentMethod,
    pub amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
impl_call!(write CreatePayment => PaymentsCreate, Payment, validate = CreatePayment::check);

impl CreatePayment {
    fn check(&self) -> Result<(), ValidationError> {
        require("accountId", &self.account_id)?;
        validate_amount("amount", &self.amount)?;
        validate_currency("currency", &self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn op_of<C: Call>() -> Operation {
        C::OPERATION
    }

    fn read<C: ReadCall>() -> (Operation, bool) {
        (op_of::<C>(), true)
    }

    fn write<C: WriteCall>() -> (Operation, bool) {
        (op_of::<C>(), false)
    }

    #[test]
    fn test_every_operation_has_one_typed_call_of_matching_kind() {
        let calls = [
            read::<GetSession>(),
            write::<Login>(),
            write::<Logout>(),
            read::<ListAccounts>(),
            read::<GetAccount>(),
            read::<GetAccountStatement>(),
            write::<CreateAccount>(),
            write::<UpdateAccount>(),
            read::<ListOrders>(),
            read::<GetOrder>(),
            write::<CreateOrder>(),
            write::<UpdateOrderStatus>(),
            read::<ListLedger>(),
            write::<RecordCollection>(),
            write::<RecordLedgerPayment>(),
            read::<ListProducts>(),
            read::<GetProduct>(),
            read::<GetBom>(),
            write::<CreateProduct>(),
            write::<UpdateProduct>(),
            read::<ListStock>(),
            read::<ListWarehouses>(),
            read::<ListMovements>(),
            read::<ListWorkOrders>(),
            write::<AdjustStock>(),
            write::<CreateWorkOrder>(),
            read::<ListInvoices>(),
            read::<GetInvoice>(),
            write::<CreateInvoice>(),
            read::<ListPrices>(),
            read::<ListCommissionRules>(),
            write::<UpdatePrice>(),
            read::<ListCheques>(),
            read::<GetChartOfAccounts>(),
            write::<CreateCheque>(),
            write::<UpdateChequeStatus>(),
            read::<GetDashboard>(),
            read::<GetSalesByMonth>(),
            read::<GetTopProducts>(),
            read::<ListCash>(),
            read::<GetCashBalance>(),
            write::<RecordCashEntry>(),
            read::<ListPayments>(),
            write::<CreatePayment>(),
        ];

        let covered: BTreeSet<_> = calls.iter().map(|(op, _)| *op).collect();
        assert_eq!(covered.len(), calls.len(), "an operation has two typed calls");
        assert_eq!(covered.len(), Operation::ALL.len());

        for (op, is_read) in calls {
            assert_eq!(op.is_read(), is_read, "{} has the wrong marker", op);
        }
    }

    #[test]
    fn test_list_args_skip_unset_filters() {
        let args = serde_json::to_value(ListOrders {
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(args, json!({"status": "SHIPPED"}));

        let accounts = serde_json::to_value(ListAccounts {
            account_type: Some(AccountType::Supplier),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(accounts, json!({"type": "SUPPLIER"}));
    }

    fn collection(amount: &str, rate: &str) -> RecordCollection {
        RecordCollection(LedgerPosting {
            account_id: "1".into(),
            amount: amount.into(),
            currency: "USD".into(),
            exchange_rate: rate.into(),
            description: "test".into(),
        })
    }

    #[test]
    fn test_collection_wire_shape_and_validation() {
        let call = collection("500.00", "1.0000");
        assert!(call.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "accountId": "1",
                "amount": "500.00",
                "currency": "USD",
                "exchangeRate": "1.0000",
                "description": "test"
            })
        );

        assert!(collection("500.001", "1.0000").validate().is_err());
        assert!(collection("0", "1.0000").validate().is_err());
        assert!(collection("10", "0").validate().is_err());
    }

    #[test]
    fn test_margin_guard() {
        let mut product = CreateProduct {
            code: "HRZ-010".into(),
            name: "Heriz 200x300".into(),
            category: ProductCategory::HandWoven,
            unit: "piece".into(),
            unit_price: "900.00".into(),
            cost_price: "1000.00".into(),
            currency: "USD".into(),
        };
        let err = product.validate().unwrap_err();
        assert!(err.to_string().contains("below cost"));

        product.unit_price = "1200.00".into();
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_order_requires_lines() {
        let order = CreateOrder {
            account_id: "1".into(),
            currency: "TRY".into(),
            lines: vec![],
        };
        assert!(matches!(
            order.validate(),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_cheque_requires_bank_but_note_does_not() {
        let mut cheque = CreateCheque {
            kind: ChequeKind::Cheque,
            number: "0001234".into(),
            drawer: "Ege Tekstil".into(),
            bank: None,
            account_id: "3".into(),
            amount: "15000.00".into(),
            currency: "TRY".into(),
            due_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        };
        assert!(cheque.validate().is_err());
        cheque.kind = ChequeKind::PromissoryNote;
        assert!(cheque.validate().is_ok());
    }

    #[test]
    fn test_adjust_rejects_zero_delta() {
        let adjust = AdjustStock {
            product_id: "p1".into(),
            warehouse_id: "w1".into(),
            quantity_delta: 0,
            reason: "count".into(),
        };
        assert!(adjust.validate().is_err());
    }
}
