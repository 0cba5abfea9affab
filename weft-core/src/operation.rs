//! Operation catalogue for the renderer-to-host bridge.
//!
//! Every remote procedure the UI may call is a variant of [`Operation`]. The
//! wire name (`"<domain>:<action>"`) is the unit of authorization, so
//! `as_str()` and `FromStr` must round-trip exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::filter::FilterSpec;

// ============================================================================
// DOMAINS
// ============================================================================

/// Business domain an operation belongs to. Doubles as the cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Auth,
    Accounts,
    Orders,
    Ledger,
    Products,
    Inventory,
    Invoices,
    Pricing,
    Finance,
    Analytics,
    Cash,
    Payments,
}

impl Domain {
    /// All domains in allow-list order.
    pub const ALL: [Domain; 12] = [
        Domain::Auth,
        Domain::Accounts,
        Domain::Orders,
        Domain::Ledger,
        Domain::Products,
        Domain::Inventory,
        Domain::Invoices,
        Domain::Pricing,
        Domain::Finance,
        Domain::Analytics,
        Domain::Cash,
        Domain::Payments,
    ];

    /// Wire prefix of this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Auth => "auth",
            Domain::Accounts => "accounts",
            Domain::Orders => "orders",
            Domain::Ledger => "ledger",
            Domain::Products => "products",
            Domain::Inventory => "inventory",
            Domain::Invoices => "invoices",
            Domain::Pricing => "pricing",
            Domain::Finance => "finance",
            Domain::Analytics => "analytics",
            Domain::Cash => "cash",
            Domain::Payments => "payments",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// OPERATION KIND AND STALENESS
// ============================================================================

/// Whether an operation reads (cacheable) or writes (invalidating).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Read => f.write_str("read"),
            OperationKind::Write => f.write_str("write"),
        }
    }
}

/// How quickly a read's cached result goes stale.
///
/// The concrete windows live in the query layer's cache configuration; the
/// defaults are 30s, 60s and 300s respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaleClass {
    /// Frequently-changing lists and detail records.
    Live,
    /// Aggregated or analytical reads.
    Analytical,
    /// Near-static reference data (warehouses, chart of accounts).
    Reference,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// A named remote operation exposed across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    AuthLogin,
    AuthLogout,
    AuthSession,

    AccountsList,
    AccountsGet,
    AccountsStatement,
    AccountsCreate,
    AccountsUpdate,

    OrdersList,
    OrdersGet,
    OrdersCreate,
    OrdersUpdateStatus,

    LedgerList,
    LedgerCollection,
    LedgerPayment,

    ProductsList,
    ProductsGet,
    ProductsBom,
    ProductsCreate,
    ProductsUpdate,

    InventoryList,
    InventoryWarehouses,
    InventoryMovements,
    InventoryWorkOrders,
    InventoryAdjust,
    InventoryCreateWorkOrder,

    InvoicesList,
    InvoicesGet,
    InvoicesCreate,

    PricingList,
    PricingCommissionRules,
    PricingUpdate,

    FinanceCheques,
    FinanceChartOfAccounts,
    FinanceCreateCheque,
    FinanceUpdateChequeStatus,

    AnalyticsDashboard,
    AnalyticsSalesByMonth,
    AnalyticsTopProducts,

    CashList,
    CashBalance,
    CashEntry,

    PaymentsList,
    PaymentsCreate,
}

impl Operation {
    /// The complete declared surface, grouped by domain.
    pub const ALL: [Operation; 44] = [
        Operation::AuthLogin,
        Operation::AuthLogout,
        Operation::AuthSession,
        Operation::AccountsList,
        Operation::AccountsGet,
        Operation::AccountsStatement,
        Operation::AccountsCreate,
        Operation::AccountsUpdate,
        Operation::OrdersList,
        Operation::OrdersGet,
        Operation::OrdersCreate,
        Operation::OrdersUpdateStatus,
        Operation::LedgerList,
        Operation::LedgerCollection,
        Operation::LedgerPayment,
        Operation::ProductsList,
        Operation::ProductsGet,
        Operation::ProductsBom,
        Operation::ProductsCreate,
        Operation::ProductsUpdate,
        Operation::InventoryList,
        Operation::InventoryWarehouses,
        Operation::InventoryMovements,
        Operation::InventoryWorkOrders,
        Operation::InventoryAdjust,
        Operation::InventoryCreateWorkOrder,
        Operation::InvoicesList,
        Operation::InvoicesGet,
        Operation::InvoicesCreate,
        Operation::PricingList,
        Operation::PricingCommissionRules,
        Operation::PricingUpdate,
        Operation::FinanceCheques,
        Operation::FinanceChartOfAccounts,
        Operation::FinanceCreateCheque,
        Operation::FinanceUpdateChequeStatus,
        Operation::AnalyticsDashboard,
        Operation::AnalyticsSalesByMonth,
        Operation::AnalyticsTopProducts,
        Operation::CashList,
        Operation::CashBalance,
        Operation::CashEntry,
        Operation::PaymentsList,
        Operation::PaymentsCreate,
    ];

    /// Exact wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AuthLogin => "auth:login",
            Operation::AuthLogout => "auth:logout",
            Operation::AuthSession => "auth:session",
            Operation::AccountsList => "accounts:list",
            Operation::AccountsGet => "accounts:get",
            Operation::AccountsStatement => "accounts:statement",
            Operation::AccountsCreate => "accounts:create",
            Operation::AccountsUpdate => "accounts:update",
            Operation::OrdersList => "orders:list",
            Operation::OrdersGet => "orders:get",
            Operation::OrdersCreate => "orders:create",
            Operation::OrdersUpdateStatus => "orders:updateStatus",
            Operation::LedgerList => "ledger:list",
            Operation::LedgerCollection => "ledger:collection",
            Operation::LedgerPayment => "ledger:payment",
            Operation::ProductsList => "products:list",
            Operation::ProductsGet => "products:get",
            Operation::ProductsBom => "products:bom",
            Operation::ProductsCreate => "products:create",
            Operation::ProductsUpdate => "products:update",
            Operation::InventoryList => "inventory:list",
            Operation::InventoryWarehouses => "inventory:warehouses",
            Operation::InventoryMovements => "inventory:movements",
            Operation::InventoryWorkOrders => "inventory:workOrders",
            Operation::InventoryAdjust => "inventory:adjust",
            Operation::InventoryCreateWorkOrder => "inventory:createWorkOrder",
            Operation::InvoicesList => "invoices:list",
            Operation::InvoicesGet => "invoices:get",
            Operation::InvoicesCreate => "invoices:create",
            Operation::PricingList => "pricing:list",
            Operation::PricingCommissionRules => "pricing:commissionRules",
            Operation::PricingUpdate => "pricing:update",
            Operation::FinanceCheques => "finance:cheques",
            Operation::FinanceChartOfAccounts => "finance:chartOfAccounts",
            Operation::FinanceCreateCheque => "finance:createCheque",
            Operation::FinanceUpdateChequeStatus => "finance:updateChequeStatus",
            Operation::AnalyticsDashboard => "analytics:dashboard",
            Operation::AnalyticsSalesByMonth => "analytics:salesByMonth",
            Operation::AnalyticsTopProducts => "analytics:topProducts",
            Operation::CashList => "cash:list",
            Operation::CashBalance => "cash:balance",
            Operation::CashEntry => "cash:entry",
            Operation::PaymentsList => "payments:list",
            Operation::PaymentsCreate => "payments:create",
        }
    }

    /// Domain (and cache namespace) of this operation.
    pub fn domain(&self) -> Domain {
        use Operation::*;
        match self {
            AuthLogin | AuthLogout | AuthSession => Domain::Auth,
            AccountsList | AccountsGet | AccountsStatement | AccountsCreate | AccountsUpdate => {
                Domain::Accounts
            }
            OrdersList | OrdersGet | OrdersCreate | OrdersUpdateStatus => Domain::Orders,
            LedgerList | LedgerCollection | LedgerPayment => Domain::Ledger,
            ProductsList | ProductsGet | ProductsBom | ProductsCreate | ProductsUpdate => {
                Domain::Products
            }
            InventoryList
            | InventoryWarehouses
            | InventoryMovements
            | InventoryWorkOrders
            | InventoryAdjust
            | InventoryCreateWorkOrder => Domain::Inventory,
            InvoicesList | InvoicesGet | InvoicesCreate => Domain::Invoices,
            PricingList | PricingCommissionRules | PricingUpdate => Domain::Pricing,
            FinanceCheques
            | FinanceChartOfAccounts
            | FinanceCreateCheque
            | FinanceUpdateChequeStatus => Domain::Finance,
            AnalyticsDashboard | AnalyticsSalesByMonth | AnalyticsTopProducts => {
                Domain::Analytics
            }
            CashList | CashBalance | CashEntry => Domain::Cash,
            PaymentsList | PaymentsCreate => Domain::Payments,
        }
    }

    /// Read or write.
    pub fn kind(&self) -> OperationKind {
        if self.invalidates().is_empty() {
            OperationKind::Read
        } else {
            OperationKind::Write
        }
    }

    pub fn is_read(&self) -> bool {
        self.kind() == OperationKind::Read
    }

    pub fn is_mutation(&self) -> bool {
        self.kind() == OperationKind::Write
    }

    /// Namespaces a successful write marks stale. Empty for reads.
    ///
    /// Every writer declares at least its own domain, which is also how
    /// [`Operation::kind`] tells readers and writers apart.
    pub fn invalidates(&self) -> &'static [Domain] {
        use Domain as D;
        use Operation::*;
        match self {
            AuthLogin | AuthLogout => &[D::Auth],
            AccountsCreate | AccountsUpdate => &[D::Accounts, D::Analytics],
            OrdersCreate => &[D::Orders, D::Accounts, D::Inventory, D::Analytics],
            OrdersUpdateStatus => &[D::Orders, D::Inventory, D::Analytics],
            LedgerCollection | LedgerPayment => &[D::Ledger, D::Accounts, D::Cash, D::Analytics],
            ProductsCreate | ProductsUpdate => &[D::Products, D::Inventory, D::Pricing],
            InventoryAdjust => &[D::Inventory, D::Products, D::Analytics],
            InventoryCreateWorkOrder => &[D::Inventory],
            InvoicesCreate => &[D::Invoices, D::Accounts, D::Ledger, D::Analytics],
            PricingUpdate => &[D::Pricing, D::Products],
            FinanceCreateCheque | FinanceUpdateChequeStatus => {
                &[D::Finance, D::Accounts, D::Ledger]
            }
            CashEntry => &[D::Cash, D::Analytics],
            PaymentsCreate => &[D::Payments, D::Accounts, D::Ledger, D::Cash, D::Analytics],
            AuthSession | AccountsList | AccountsGet | AccountsStatement | OrdersList
            | OrdersGet | LedgerList | ProductsList | ProductsGet | ProductsBom
            | InventoryList | InventoryWarehouses | InventoryMovements | InventoryWorkOrders
            | InvoicesList | InvoicesGet | PricingList | PricingCommissionRules
            | FinanceCheques | FinanceChartOfAccounts | AnalyticsDashboard
            | AnalyticsSalesByMonth | AnalyticsTopProducts | CashList | CashBalance
            | PaymentsList => &[],
        }
    }

    /// Staleness class for reads; `None` for writes.
    pub fn stale_class(&self) -> Option<StaleClass> {
        use Operation::*;
        if self.is_mutation() {
            return None;
        }
        Some(match self {
            AuthSession | InventoryWarehouses | FinanceChartOfAccounts
            | PricingCommissionRules => StaleClass::Reference,
            AnalyticsDashboard | AnalyticsSalesByMonth | AnalyticsTopProducts | PricingList
            | ProductsBom => StaleClass::Analytical,
            _ => StaleClass::Live,
        })
    }

    /// Declared list filter, if this read accepts search/equality arguments.
    pub fn filter_spec(&self) -> Option<FilterSpec> {
        use Operation::*;
        let spec = match self {
            AccountsList => FilterSpec::new(&["name", "code"], &["type"]),
            ProductsList => FilterSpec::new(&["name", "code"], &["category"]),
            OrdersList => FilterSpec::new(&["orderNo", "accountName"], &["status", "accountId"]),
            InventoryList => FilterSpec::new(
                &["productName", "productCode"],
                &["warehouseId", "productId"],
            ),
            InventoryMovements => FilterSpec::new(&[], &["warehouseId", "productId"]),
            InventoryWorkOrders => FilterSpec::new(&["productName"], &["status"]),
            InvoicesList => {
                FilterSpec::new(&["invoiceNo", "accountName"], &["status", "accountId"])
            }
            LedgerList => FilterSpec::new(&["description"], &["accountId"]),
            PricingList => FilterSpec::new(&["productName"], &["priceList"]),
            FinanceCheques => FilterSpec::new(&["number", "drawer"], &["status", "kind"]),
            CashList => FilterSpec::new(&["description"], &["direction", "currency"]),
            PaymentsList => FilterSpec::new(&[], &["accountId", "method"]),
            _ => return None,
        };
        Some(spec)
    }

    /// Iterate the operations of one domain.
    pub fn in_domain(domain: Domain) -> impl Iterator<Item = Operation> {
        Operation::ALL
            .into_iter()
            .filter(move |op| op.domain() == domain)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no declared operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for op in Operation::ALL {
            assert!(seen.insert(op.as_str()), "duplicate name {}", op);
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_name_prefix_matches_domain() {
        for op in Operation::ALL {
            let (prefix, action) = op.as_str().split_once(':').unwrap();
            assert_eq!(prefix, op.domain().as_str());
            assert!(!action.is_empty());
        }
    }

    #[test]
    fn test_writers_invalidate_their_own_domain() {
        for op in Operation::ALL.iter().filter(|op| op.is_mutation()) {
            assert!(
                op.invalidates().contains(&op.domain()),
                "{} does not invalidate its own namespace",
                op
            );
            assert!(op.stale_class().is_none());
        }
    }

    #[test]
    fn test_reads_have_stale_class() {
        for op in Operation::ALL.iter().filter(|op| op.is_read()) {
            assert!(op.stale_class().is_some(), "{} has no stale class", op);
        }
        assert_eq!(
            Operation::InventoryWarehouses.stale_class(),
            Some(StaleClass::Reference)
        );
        assert_eq!(
            Operation::AnalyticsDashboard.stale_class(),
            Some(StaleClass::Analytical)
        );
        assert_eq!(Operation::OrdersList.stale_class(), Some(StaleClass::Live));
    }

    #[test]
    fn test_collection_invalidates_accounts_and_analytics() {
        let targets = Operation::LedgerCollection.invalidates();
        assert!(targets.contains(&Domain::Accounts));
        assert!(targets.contains(&Domain::Analytics));
    }

    #[test]
    fn test_undeclared_name_does_not_parse() {
        let err = "accounts:delete".parse::<Operation>().unwrap_err();
        assert_eq!(err.0, "accounts:delete");
        assert!("ACCOUNTS:LIST".parse::<Operation>().is_err());
        assert!("".parse::<Operation>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&Operation::OrdersUpdateStatus).unwrap();
        assert_eq!(json, "\"orders:updateStatus\"");
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Operation::OrdersUpdateStatus);
    }

    #[test]
    fn test_in_domain() {
        let cash: Vec<_> = Operation::in_domain(Domain::Cash).collect();
        assert_eq!(
            cash,
            vec![Operation::CashList, Operation::CashBalance, Operation::CashEntry]
        );
    }
}
