//! Business payloads carried across the bridge.
//!
//! The data-access layer treats these as opaque JSON; they exist so typed
//! calls and fixture data share one shape. Field names are camelCase and
//! enum values SCREAMING_SNAKE_CASE on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

// ============================================================================
// ACCOUNTS AND LEDGER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Customer,
    Supplier,
    Agency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub currency: String,
    /// Positive means the account owes us.
    pub balance: Money,
    pub phone: Option<String>,
    pub city: Option<String>,
    /// Agency that brought the account in, for commission.
    pub agency_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerKind {
    Sale,
    Purchase,
    Collection,
    Payment,
    Commission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub kind: LedgerKind,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatement {
    pub account: Account,
    pub entries: Vec<LedgerEntry>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub balance: Money,
}

// ============================================================================
// PRODUCTS, STOCK AND MANUFACTURING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    HandWoven,
    MachineMade,
    Kilim,
    RawMaterial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: ProductCategory,
    /// Unit of measure: m2, piece, kg.
    pub unit: String,
    pub unit_price: Money,
    pub cost_price: Money,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    pub warehouse_id: String,
    pub quantity: i64,
    pub min_quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    In,
    Out,
    Adjustment,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLine {
    pub component_id: String,
    pub component_name: String,
    /// Quantity per one unit of the finished product, as a decimal string.
    pub quantity: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillOfMaterials {
    pub product_id: String,
    pub lines: Vec<BomLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub number: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub status: WorkOrderStatus,
    pub due_date: NaiveDate,
}

// ============================================================================
// ORDERS AND INVOICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_no: String,
    pub account_id: String,
    pub account_name: String,
    pub date: NaiveDate,
    pub status: OrderStatus,
    pub currency: String,
    pub lines: Vec<OrderLine>,
    pub total: Money,
    pub commission: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_no: String,
    pub order_id: Option<String>,
    pub account_id: String,
    pub account_name: String,
    pub date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency: String,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

// ============================================================================
// PRICING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListEntry {
    pub id: String,
    pub price_list: String,
    pub product_id: String,
    pub product_name: String,
    pub price: Money,
    pub currency: String,
    /// Lowest margin over cost the sales screen may accept, in basis points.
    pub min_margin_bp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRule {
    pub id: String,
    pub agency_id: String,
    pub category: Option<ProductCategory>,
    pub rate_bp: i64,
}

// ============================================================================
// FINANCE, CASH AND PAYMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChequeKind {
    Cheque,
    PromissoryNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChequeStatus {
    Portfolio,
    Endorsed,
    Deposited,
    Collected,
    Bounced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cheque {
    pub id: String,
    pub kind: ChequeKind,
    pub number: String,
    pub drawer: String,
    pub bank: Option<String>,
    pub account_id: String,
    pub amount: Money,
    pub currency: String,
    pub due_date: NaiveDate,
    pub status: ChequeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAccountClass {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// One row of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub code: String,
    pub name: String,
    pub class: LedgerAccountClass,
    pub parent_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashDirection {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    pub id: String,
    pub date: NaiveDate,
    pub direction: CashDirection,
    pub amount: Money,
    pub currency: String,
    pub description: String,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    pub currency: String,
    pub total_in: Money,
    pub total_out: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    Cheque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: Money,
    pub currency: String,
    pub reference: Option<String>,
}

// ============================================================================
// ANALYTICS AND SESSION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_receivables: Money,
    pub total_payables: Money,
    pub open_orders: u32,
    pub low_stock_items: u32,
    pub cheques_in_portfolio: Money,
    pub monthly_sales: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    /// `YYYY-MM`.
    pub month: String,
    pub total: Money,
    pub order_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Accountant,
    Sales,
    Warehouse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_wire_shape() {
        let account = Account {
            id: "1".into(),
            code: "C-001".into(),
            name: "Antik Halı".into(),
            account_type: AccountType::Customer,
            currency: "TRY".into(),
            balance: "1250.50".parse().unwrap(),
            phone: None,
            city: Some("İstanbul".into()),
            agency_id: None,
        };
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["type"], "CUSTOMER");
        assert_eq!(value["balance"], "1250.50");
        assert_eq!(value["agencyId"], json!(null));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(ChequeKind::PromissoryNote).unwrap(),
            "PROMISSORY_NOTE"
        );
        assert_eq!(serde_json::to_value(OrderStatus::Shipped).unwrap(), "SHIPPED");
        assert_eq!(
            serde_json::to_value(PaymentMethod::BankTransfer).unwrap(),
            "BANK_TRANSFER"
        );
    }
}
