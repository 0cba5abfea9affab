//! The fixture set and its read dispatch.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use weft_core::entities::{
    Account, BillOfMaterials, Cheque, CommissionRule, Invoice, LedgerAccount, LedgerEntry, Order,
    Payment, PriceListEntry, Product, Session, StockItem, StockMovement, Warehouse, WorkOrder,
};
use weft_core::entities::CashEntry as CashRecord;
use weft_core::{BridgeError, ListFilter, MutationResponse, Operation, Rate};

use crate::analytics;

/// Currency every analytics figure is reported in.
pub const BASE_CURRENCY: &str = "TRY";

/// In-memory stand-in for the privileged backend.
///
/// Reads are answered from these collections with the same filter semantics
/// as real handlers. Nothing here is ever modified by a write.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet {
    pub session: Session,
    pub accounts: Vec<Account>,
    pub ledger: Vec<LedgerEntry>,
    pub products: Vec<Product>,
    pub boms: Vec<BillOfMaterials>,
    pub warehouses: Vec<Warehouse>,
    pub stock: Vec<StockItem>,
    pub movements: Vec<StockMovement>,
    pub work_orders: Vec<WorkOrder>,
    pub orders: Vec<Order>,
    pub invoices: Vec<Invoice>,
    pub prices: Vec<PriceListEntry>,
    pub commission_rules: Vec<CommissionRule>,
    pub cheques: Vec<Cheque>,
    pub chart_of_accounts: Vec<LedgerAccount>,
    pub cash: Vec<CashRecord>,
    pub payments: Vec<Payment>,
    /// Rates into [`BASE_CURRENCY`].
    pub exchange_rates: BTreeMap<String, Rate>,
}

impl FixtureSet {
    /// Rate converting `currency` into the base currency.
    pub fn rate(&self, currency: &str) -> Rate {
        if currency == BASE_CURRENCY {
            return Rate::ONE;
        }
        self.exchange_rates
            .get(currency)
            .copied()
            .unwrap_or(Rate::ONE)
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Answer an operation from the fixtures.
    ///
    /// Writes are acknowledged with `{"success": true}` and change nothing.
    pub fn respond(&self, operation: Operation, args: &Value) -> Result<Value, BridgeError> {
        use Operation::*;
        match operation {
            AuthSession => encode(operation, &self.session),

            AccountsList => list(operation, &self.accounts, args),
            AccountsGet => encode(operation, &find(&self.accounts, args, "id", |a| &a.id)),
            AccountsStatement => {
                let statement = arg_str(args, "accountId")
                    .and_then(|id| analytics::statement(self, id));
                encode(operation, &statement)
            }

            OrdersList => list(operation, &self.orders, args),
            OrdersGet => encode(operation, &find(&self.orders, args, "id", |o| &o.id)),

            LedgerList => list(operation, &self.ledger, args),

            ProductsList => list(operation, &self.products, args),
            ProductsGet => encode(operation, &find(&self.products, args, "id", |p| &p.id)),
            ProductsBom => encode(
                operation,
                &find(&self.boms, args, "productId", |b| &b.product_id),
            ),

            InventoryList => list(operation, &self.stock, args),
            InventoryWarehouses => encode(operation, &self.warehouses),
            InventoryMovements => list(operation, &self.movements, args),
            InventoryWorkOrders => list(operation, &self.work_orders, args),

            InvoicesList => list(operation, &self.invoices, args),
            InvoicesGet => encode(operation, &find(&self.invoices, args, "id", |i| &i.id)),

            PricingList => list(operation, &self.prices, args),
            PricingCommissionRules => encode(operation, &self.commission_rules),

            FinanceCheques => list(operation, &self.cheques, args),
            FinanceChartOfAccounts => encode(operation, &self.chart_of_accounts),

            AnalyticsDashboard => encode(operation, &analytics::dashboard(self)),
            AnalyticsSalesByMonth => {
                // Out-of-range years filter nothing.
                let year = args
                    .get("year")
                    .and_then(Value::as_i64)
                    .and_then(|y| i32::try_from(y).ok());
                encode(operation, &analytics::sales_by_month(self, year))
            }
            AnalyticsTopProducts => {
                let limit = args
                    .get("limit")
                    .and_then(Value::as_u64)
                    .map(|l| l as usize)
                    .unwrap_or(analytics::DEFAULT_TOP_PRODUCTS);
                encode(operation, &analytics::top_products(self, limit))
            }

            CashList => list(operation, &self.cash, args),
            CashBalance => encode(operation, &analytics::cash_balance(self)),

            PaymentsList => list(operation, &self.payments, args),

            AuthLogin | AuthLogout | AccountsCreate | AccountsUpdate | OrdersCreate
            | OrdersUpdateStatus | LedgerCollection | LedgerPayment | ProductsCreate
            | ProductsUpdate | InventoryAdjust | InventoryCreateWorkOrder | InvoicesCreate
            | PricingUpdate | FinanceCreateCheque | FinanceUpdateChequeStatus | CashEntry
            | PaymentsCreate => Ok(MutationResponse::ok().into_value()),
        }
    }
}

fn encode<T: Serialize + ?Sized>(operation: Operation, value: &T) -> Result<Value, BridgeError> {
    serde_json::to_value(value).map_err(|e| BridgeError::malformed(operation.as_str(), e.to_string()))
}

/// Serialize a collection and apply the operation's declared filter.
fn list<T: Serialize>(operation: Operation, items: &[T], args: &Value) -> Result<Value, BridgeError> {
    let rows = items
        .iter()
        .map(|item| encode(operation, item))
        .collect::<Result<Vec<_>, _>>()?;
    let rows = match operation.filter_spec() {
        Some(spec) => ListFilter::from_args(spec, args).apply(rows),
        None => rows,
    };
    Ok(Value::Array(rows))
}

fn arg_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn find<'a, T>(
    items: &'a [T],
    args: &Value,
    arg: &str,
    id: impl Fn(&T) -> &String,
) -> Option<&'a T> {
    let wanted = arg_str(args, arg)?;
    items.iter().find(|item| id(item) == wanted)
}
