//! The deterministic demo data set.
//!
//! A small carpet house: a handful of customers, suppliers and agencies,
//! hand-woven and machine-made stock across three warehouses, and the orders,
//! invoices, payments and cheques that tie them together. Derived figures
//! (order totals, commissions, invoice tax, ledger postings, account
//! balances) are computed here so the set is internally consistent.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use weft_core::entities::{
    Account, AccountType, BillOfMaterials, BomLine, CashDirection, Cheque, ChequeKind,
    ChequeStatus, CommissionRule, Invoice, InvoiceStatus, LedgerAccount, LedgerAccountClass,
    LedgerEntry, LedgerKind, MovementKind, Order, OrderLine, OrderStatus, Payment, PaymentMethod,
    PriceListEntry, Product, ProductCategory, Role, Session, StockItem, StockMovement, Warehouse,
    WorkOrder, WorkOrderStatus,
};
use weft_core::entities::CashEntry as CashRecord;
use weft_core::{Money, Rate};

use crate::set::{FixtureSet, BASE_CURRENCY};

/// VAT applied to domestic invoices, in basis points.
const DOMESTIC_VAT_BP: i64 = 2_000;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn money(major: i64, minor: i64) -> Money {
    Money::from_minor(major * 100 + minor)
}

fn whole(major: i64) -> Money {
    money(major, 0)
}

impl FixtureSet {
    /// Build the demo set. Every call returns an identical value.
    pub fn demo() -> Self {
        let session = Session {
            user_id: "U-1".into(),
            username: "demo".into(),
            display_name: "Demo Kullanıcı".into(),
            role: Role::Admin,
        };

        let products = products();
        let commission_rules = commission_rules();
        let mut accounts = accounts();
        let orders = orders(&accounts, &products, &commission_rules);
        let invoices = invoices(&orders);
        let payments = payments();
        let ledger = ledger(&invoices, &payments, &accounts);

        for account in &mut accounts {
            account.balance = ledger
                .iter()
                .filter(|e| e.account_id == account.id)
                .map(|e| e.debit - e.credit)
                .sum();
        }

        let mut exchange_rates = BTreeMap::new();
        exchange_rates.insert("USD".to_string(), Rate::from_scaled(325_000));
        exchange_rates.insert("EUR".to_string(), Rate::from_scaled(352_000));

        Self {
            session,
            prices: prices(&products),
            boms: boms(&products),
            warehouses: warehouses(),
            stock: stock(&products),
            movements: movements(),
            work_orders: work_orders(&products),
            cheques: cheques(),
            chart_of_accounts: chart_of_accounts(),
            cash: cash(),
            accounts,
            ledger,
            products,
            orders,
            invoices,
            commission_rules,
            payments,
            exchange_rates,
        }
    }
}

fn account(
    id: &str,
    code: &str,
    name: &str,
    account_type: AccountType,
    currency: &str,
    city: &str,
    agency_id: Option<&str>,
) -> Account {
    Account {
        id: id.into(),
        code: code.into(),
        name: name.into(),
        account_type,
        currency: currency.into(),
        balance: Money::ZERO,
        phone: None,
        city: Some(city.into()),
        agency_id: agency_id.map(Into::into),
    }
}

fn accounts() -> Vec<Account> {
    use AccountType::*;
    let mut list = vec![
        account("1", "C-001", "Yildiz Hali Ltd.", Customer, "TRY", "İstanbul", Some("7")),
        account("2", "C-002", "Bosphorus Rugs GmbH", Customer, "EUR", "Hamburg", Some("7")),
        account("3", "C-003", "Kapadokya Dekor", Customer, "TRY", "Nevşehir", None),
        account("4", "C-004", "Atlantic Carpet Co.", Customer, "USD", "New York", Some("8")),
        account("5", "S-001", "Ege Tekstil Iplik", Supplier, "TRY", "İzmir", None),
        account("6", "S-002", "Gaziantep Yun Sanayi", Supplier, "TRY", "Gaziantep", None),
        account("7", "A-001", "Marmara Ajans", Agency, "TRY", "Bursa", None),
        account("8", "A-002", "Transatlantic Agency LLC", Agency, "USD", "Miami", None),
    ];
    list[0].phone = Some("+90 212 555 0101".into());
    list[2].phone = Some("+90 384 555 0133".into());
    list
}

fn product(
    id: &str,
    code: &str,
    name: &str,
    category: ProductCategory,
    unit: &str,
    unit_price: Money,
    cost_price: Money,
) -> Product {
    Product {
        id: id.into(),
        code: code.into(),
        name: name.into(),
        category,
        unit: unit.into(),
        unit_price,
        cost_price,
        currency: "USD".into(),
    }
}

fn products() -> Vec<Product> {
    use ProductCategory::*;
    vec![
        product("P-01", "HRZ-001", "Antique Heriz 200x300", HandWoven, "piece", whole(4_800), whole(3_100)),
        product("P-02", "PNT-002", "Pantheon Runner 80x300", MachineMade, "piece", whole(320), whole(180)),
        product("P-03", "KLM-003", "Anatolian Kilim 120x180", Kilim, "piece", whole(650), whole(410)),
        product("P-04", "KNY-004", "Konya Prayer Rug 90x150", HandWoven, "piece", whole(1_150), whole(720)),
        product("P-05", "KSH-005", "Elegant Kashan 200x250", HandWoven, "piece", whole(3_600), whole(2_300)),
        product("P-06", "KZK-006", "Kazak Machine 160x230", MachineMade, "piece", whole(210), whole(115)),
        product("P-07", "HRK-007", "Hereke Silk 100x150", HandWoven, "piece", whole(7_900), whole(5_200)),
        product("P-08", "YRN-008", "Wool Yarn Madder Red", RawMaterial, "kg", money(14, 50), whole(11)),
        product("P-09", "WRP-009", "Cotton Warp Ne 8/6", RawMaterial, "kg", money(6, 20), money(4, 80)),
    ]
}

fn boms(products: &[Product]) -> Vec<BillOfMaterials> {
    let component = |id: &str, quantity: &str| {
        let part = products.iter().find(|p| p.id == id);
        BomLine {
            component_id: id.into(),
            component_name: part.map(|p| p.name.clone()).unwrap_or_default(),
            quantity: quantity.into(),
            unit: part.map(|p| p.unit.clone()).unwrap_or_default(),
        }
    };
    vec![
        BillOfMaterials {
            product_id: "P-01".into(),
            lines: vec![component("P-08", "18.5"), component("P-09", "4.2")],
        },
        BillOfMaterials {
            product_id: "P-04".into(),
            lines: vec![component("P-08", "6.0"), component("P-09", "1.5")],
        },
        BillOfMaterials {
            product_id: "P-05".into(),
            lines: vec![component("P-08", "14.0"), component("P-09", "3.5")],
        },
    ]
}

fn warehouses() -> Vec<Warehouse> {
    let warehouse = |id: &str, code: &str, name: &str, city: &str| Warehouse {
        id: id.into(),
        code: code.into(),
        name: name.into(),
        city: city.into(),
    };
    vec![
        warehouse("W-1", "MRK", "Merkez Depo", "İstanbul"),
        warehouse("W-2", "KYS", "Kayseri Atölye", "Kayseri"),
        warehouse("W-3", "IZM", "İzmir Showroom", "İzmir"),
    ]
}

fn stock(products: &[Product]) -> Vec<StockItem> {
    let item = |product_id: &str, warehouse_id: &str, quantity: i64, min_quantity: i64| {
        let product = products.iter().find(|p| p.id == product_id);
        StockItem {
            product_id: product_id.into(),
            product_code: product.map(|p| p.code.clone()).unwrap_or_default(),
            product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
            warehouse_id: warehouse_id.into(),
            quantity,
            min_quantity,
        }
    };
    vec![
        item("P-01", "W-1", 6, 2),
        item("P-01", "W-3", 2, 1),
        item("P-02", "W-1", 40, 10),
        item("P-03", "W-1", 12, 5),
        item("P-04", "W-2", 3, 4),
        item("P-05", "W-1", 4, 2),
        item("P-06", "W-1", 85, 20),
        item("P-07", "W-3", 1, 1),
        item("P-08", "W-2", 420, 500),
        item("P-09", "W-2", 260, 150),
    ]
}

fn movements() -> Vec<StockMovement> {
    let movement = |id: &str,
                    product_id: &str,
                    warehouse_id: &str,
                    date: NaiveDate,
                    kind: MovementKind,
                    quantity: i64,
                    reference: Option<&str>| StockMovement {
        id: id.into(),
        product_id: product_id.into(),
        warehouse_id: warehouse_id.into(),
        date,
        kind,
        quantity,
        reference: reference.map(Into::into),
    };
    use MovementKind::*;
    vec![
        movement("M-001", "P-01", "W-1", date(2026, 7, 3), Out, 2, Some("ORD-2026-0001")),
        movement("M-002", "P-02", "W-1", date(2026, 7, 15), In, 50, Some("S-001")),
        movement("M-003", "P-01", "W-3", date(2026, 8, 1), Transfer, 2, Some("W-1")),
        movement("M-004", "P-02", "W-1", date(2026, 8, 11), Out, 10, Some("ORD-2026-0003")),
        movement("M-005", "P-08", "W-2", date(2026, 8, 22), In, 600, Some("S-002")),
        movement("M-006", "P-08", "W-2", date(2026, 9, 5), Out, 180, Some("WO-2026-011")),
        movement("M-007", "P-04", "W-2", date(2026, 9, 12), Adjustment, -1, None),
    ]
}

fn work_orders(products: &[Product]) -> Vec<WorkOrder> {
    let work_order = |id: &str,
                      number: &str,
                      product_id: &str,
                      quantity: i64,
                      status: WorkOrderStatus,
                      due_date: NaiveDate| WorkOrder {
        id: id.into(),
        number: number.into(),
        product_id: product_id.into(),
        product_name: products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.name.clone())
            .unwrap_or_default(),
        quantity,
        status,
        due_date,
    };
    use WorkOrderStatus::*;
    vec![
        work_order("WO-9", "WO-2026-009", "P-05", 1, Completed, date(2026, 8, 30)),
        work_order("WO-11", "WO-2026-011", "P-01", 2, InProgress, date(2026, 11, 15)),
        work_order("WO-12", "WO-2026-012", "P-04", 5, Planned, date(2026, 12, 1)),
    ]
}

fn commission_rules() -> Vec<CommissionRule> {
    vec![
        CommissionRule {
            id: "CR-1".into(),
            agency_id: "7".into(),
            category: None,
            rate_bp: 250,
        },
        CommissionRule {
            id: "CR-2".into(),
            agency_id: "8".into(),
            category: None,
            rate_bp: 300,
        },
        CommissionRule {
            id: "CR-3".into(),
            agency_id: "7".into(),
            category: Some(ProductCategory::HandWoven),
            rate_bp: 400,
        },
    ]
}

/// Commission for one order line: a category rule wins over the agency's
/// general rule.
fn line_commission(
    rules: &[CommissionRule],
    agency_id: &str,
    category: Option<ProductCategory>,
    amount: Money,
) -> Money {
    let specific = rules
        .iter()
        .find(|r| r.agency_id == agency_id && r.category.is_some() && r.category == category);
    let general = rules
        .iter()
        .find(|r| r.agency_id == agency_id && r.category.is_none());
    specific
        .or(general)
        .map(|r| amount.percent_bp(r.rate_bp))
        .unwrap_or(Money::ZERO)
}

fn orders(
    accounts: &[Account],
    products: &[Product],
    rules: &[CommissionRule],
) -> Vec<Order> {
    let line = |product_id: &str, quantity: i64, unit_price: Money| OrderLine {
        product_id: product_id.into(),
        quantity,
        unit_price,
    };
    let order = |id: &str,
                 order_no: &str,
                 account_id: &str,
                 date: NaiveDate,
                 status: OrderStatus,
                 currency: &str,
                 lines: Vec<OrderLine>| {
        let account = accounts.iter().find(|a| a.id == account_id);
        let mut total = Money::ZERO;
        let mut commission = Money::ZERO;
        for l in &lines {
            let amount = Money::from_minor(l.unit_price.minor() * l.quantity);
            total = total + amount;
            if let Some(agency) = account.and_then(|a| a.agency_id.as_deref()) {
                let category = products
                    .iter()
                    .find(|p| p.id == l.product_id)
                    .map(|p| p.category);
                commission = commission + line_commission(rules, agency, category, amount);
            }
        }
        Order {
            id: id.into(),
            order_no: order_no.into(),
            account_id: account_id.into(),
            account_name: account.map(|a| a.name.clone()).unwrap_or_default(),
            date,
            status,
            currency: currency.into(),
            lines,
            total,
            commission,
        }
    };
    use OrderStatus::*;
    vec![
        order("O-1", "ORD-2026-0001", "1", date(2026, 7, 3), Delivered, "TRY",
            vec![line("P-01", 2, whole(31_250))]),
        order("O-2", "ORD-2026-0002", "2", date(2026, 8, 5), Shipped, "EUR",
            vec![line("P-03", 8, whole(600)), line("P-06", 40, whole(190))]),
        order("O-3", "ORD-2026-0003", "1", date(2026, 8, 11), Confirmed, "TRY",
            vec![line("P-02", 10, whole(1_825))]),
        order("O-4", "ORD-2026-0004", "4", date(2026, 9, 14), Shipped, "USD",
            vec![line("P-07", 1, whole(7_900)), line("P-05", 2, whole(3_600))]),
        order("O-5", "ORD-2026-0005", "3", date(2026, 10, 2), Pending, "TRY",
            vec![line("P-04", 3, whole(38_000))]),
        order("O-6", "ORD-2026-0006", "2", date(2026, 10, 6), Cancelled, "EUR",
            vec![line("P-06", 20, whole(190))]),
    ]
}

fn invoices(orders: &[Order]) -> Vec<Invoice> {
    let billed = [
        ("I-1", "INV-2026-0001", "O-1", InvoiceStatus::Issued),
        ("I-2", "INV-2026-0002", "O-2", InvoiceStatus::Paid),
        ("I-3", "INV-2026-0003", "O-3", InvoiceStatus::Issued),
        ("I-4", "INV-2026-0004", "O-4", InvoiceStatus::Issued),
    ];
    billed
        .iter()
        .filter_map(|(id, invoice_no, order_id, status)| {
            let order = orders.iter().find(|o| o.id == *order_id)?;
            let subtotal = order.total;
            let tax = if order.currency == BASE_CURRENCY {
                subtotal.percent_bp(DOMESTIC_VAT_BP)
            } else {
                Money::ZERO
            };
            Some(Invoice {
                id: (*id).into(),
                invoice_no: (*invoice_no).into(),
                order_id: Some(order.id.clone()),
                account_id: order.account_id.clone(),
                account_name: order.account_name.clone(),
                date: order.date,
                status: *status,
                currency: order.currency.clone(),
                subtotal,
                tax,
                total: subtotal + tax,
            })
        })
        .collect()
}

fn payments() -> Vec<Payment> {
    let payment = |id: &str,
                   account_id: &str,
                   date: NaiveDate,
                   method: PaymentMethod,
                   amount: Money,
                   currency: &str,
                   reference: Option<&str>| Payment {
        id: id.into(),
        account_id: account_id.into(),
        date,
        method,
        amount,
        currency: currency.into(),
        reference: reference.map(Into::into),
    };
    use PaymentMethod::*;
    vec![
        payment("PAY-1", "1", date(2026, 7, 20), BankTransfer, whole(20_000), "TRY", Some("EFT-88412")),
        payment("PAY-2", "2", date(2026, 8, 28), BankTransfer, whole(12_400), "EUR", Some("SWIFT-5521")),
        payment("PAY-3", "1", date(2026, 9, 2), Cheque, whole(12_000), "TRY", Some("0031177")),
        payment("PAY-4", "6", date(2026, 9, 10), Cash, whole(6_000), "TRY", None),
    ]
}

/// Post invoices, payments, purchases and commissions, oldest first.
fn ledger(invoices: &[Invoice], payments: &[Payment], accounts: &[Account]) -> Vec<LedgerEntry> {
    struct Posting {
        account_id: String,
        date: NaiveDate,
        kind: LedgerKind,
        description: String,
        debit: Money,
        credit: Money,
        currency: String,
    }

    let mut postings = Vec::new();

    for invoice in invoices {
        postings.push(Posting {
            account_id: invoice.account_id.clone(),
            date: invoice.date,
            kind: LedgerKind::Sale,
            description: format!("Invoice {}", invoice.invoice_no),
            debit: invoice.total,
            credit: Money::ZERO,
            currency: invoice.currency.clone(),
        });
    }

    for payment in payments {
        let is_customer = accounts
            .iter()
            .any(|a| a.id == payment.account_id && a.account_type == AccountType::Customer);
        let reference = payment.reference.as_deref().unwrap_or("cash");
        let (kind, description, debit, credit) = if is_customer {
            (LedgerKind::Collection, format!("Collection {}", reference), Money::ZERO, payment.amount)
        } else {
            (LedgerKind::Payment, format!("Payment {}", reference), payment.amount, Money::ZERO)
        };
        postings.push(Posting {
            account_id: payment.account_id.clone(),
            date: payment.date,
            kind,
            description,
            debit,
            credit,
            currency: payment.currency.clone(),
        });
    }

    let manual = [
        ("5", date(2026, 6, 18), LedgerKind::Purchase, "Wool yarn lot 42", whole(35_200), "TRY"),
        ("6", date(2026, 8, 22), LedgerKind::Purchase, "Raw wool 2 tonnes", whole(14_900), "TRY"),
        ("7", date(2026, 9, 30), LedgerKind::Commission, "Q3 agency commission", whole(2_150), "TRY"),
        ("8", date(2026, 9, 30), LedgerKind::Commission, "Q3 agency commission", whole(640), "USD"),
    ];
    for (account_id, date, kind, description, credit, currency) in manual {
        postings.push(Posting {
            account_id: account_id.into(),
            date,
            kind,
            description: description.into(),
            debit: Money::ZERO,
            credit,
            currency: currency.into(),
        });
    }

    postings.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.account_id.cmp(&b.account_id)));
    postings
        .into_iter()
        .enumerate()
        .map(|(i, p)| LedgerEntry {
            id: format!("L-{:03}", i + 1),
            account_id: p.account_id,
            date: p.date,
            kind: p.kind,
            description: p.description,
            debit: p.debit,
            credit: p.credit,
            currency: p.currency,
        })
        .collect()
}

fn prices(products: &[Product]) -> Vec<PriceListEntry> {
    let mut entries = Vec::new();
    for product in products
        .iter()
        .filter(|p| p.category != ProductCategory::RawMaterial)
    {
        entries.push(PriceListEntry {
            id: format!("PL-RETAIL-{}", product.code),
            price_list: "RETAIL".into(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.unit_price,
            currency: product.currency.clone(),
            min_margin_bp: 2_500,
        });
        entries.push(PriceListEntry {
            id: format!("PL-EXPORT-{}", product.code),
            price_list: "EXPORT".into(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.unit_price.percent_bp(9_000),
            currency: product.currency.clone(),
            min_margin_bp: 1_500,
        });
    }
    entries
}

fn cheques() -> Vec<Cheque> {
    let cheque = |id: &str,
                  kind: ChequeKind,
                  number: &str,
                  drawer: &str,
                  bank: Option<&str>,
                  account_id: &str,
                  amount: Money,
                  currency: &str,
                  due_date: NaiveDate,
                  status: ChequeStatus| Cheque {
        id: id.into(),
        kind,
        number: number.into(),
        drawer: drawer.into(),
        bank: bank.map(Into::into),
        account_id: account_id.into(),
        amount,
        currency: currency.into(),
        due_date,
        status,
    };
    use ChequeStatus::*;
    vec![
        cheque("CHQ-1", ChequeKind::Cheque, "0045871", "Yildiz Hali Ltd.", Some("Garanti BBVA"), "1",
            whole(20_000), "TRY", date(2026, 11, 30), Portfolio),
        cheque("CHQ-2", ChequeKind::PromissoryNote, "SN-2026-014", "Kapadokya Dekor", None, "3",
            whole(15_000), "TRY", date(2026, 12, 15), Portfolio),
        cheque("CHQ-3", ChequeKind::Cheque, "0031177", "Yildiz Hali Ltd.", Some("İş Bankası"), "1",
            whole(12_000), "TRY", date(2026, 9, 2), Collected),
        cheque("CHQ-4", ChequeKind::Cheque, "0078420", "Kapadokya Dekor", Some("Ziraat Bankası"), "5",
            whole(8_500), "TRY", date(2026, 10, 20), Endorsed),
        cheque("CHQ-5", ChequeKind::Cheque, "0012009", "Atlantic Carpet Co.", Some("Citibank"), "4",
            whole(2_000), "USD", date(2026, 8, 15), Bounced),
    ]
}

fn chart_of_accounts() -> Vec<LedgerAccount> {
    let row = |code: &str, name: &str, class: LedgerAccountClass, parent: Option<&str>| {
        LedgerAccount {
            code: code.into(),
            name: name.into(),
            class,
            parent_code: parent.map(Into::into),
        }
    };
    use LedgerAccountClass::*;
    vec![
        row("100", "Kasa", Asset, None),
        row("102", "Bankalar", Asset, None),
        row("120", "Alıcılar", Asset, None),
        row("120.01", "Yurt İçi Alıcılar", Asset, Some("120")),
        row("120.02", "Yurt Dışı Alıcılar", Asset, Some("120")),
        row("121", "Alacak Senetleri", Asset, None),
        row("153", "Ticari Mallar", Asset, None),
        row("320", "Satıcılar", Liability, None),
        row("321", "Borç Senetleri", Liability, None),
        row("500", "Sermaye", Equity, None),
        row("600", "Yurt İçi Satışlar", Revenue, None),
        row("601", "Yurt Dışı Satışlar", Revenue, None),
        row("760", "Pazarlama Satış ve Dağıtım Giderleri", Expense, None),
    ]
}

fn cash() -> Vec<CashRecord> {
    let entry = |id: &str,
                 date: NaiveDate,
                 direction: CashDirection,
                 amount: Money,
                 currency: &str,
                 description: &str,
                 account_id: Option<&str>| CashRecord {
        id: id.into(),
        date,
        direction,
        amount,
        currency: currency.into(),
        description: description.into(),
        account_id: account_id.map(Into::into),
    };
    use CashDirection::*;
    vec![
        entry("CSH-1", date(2026, 9, 2), In, whole(12_000), "TRY", "Cheque 0031177 collected", Some("1")),
        entry("CSH-2", date(2026, 9, 3), Out, whole(1_850), "TRY", "Workshop electricity bill", None),
        entry("CSH-3", date(2026, 9, 10), Out, whole(6_000), "TRY", "Payment to Gaziantep Yun", Some("6")),
        entry("CSH-4", date(2026, 9, 18), In, whole(900), "USD", "Showroom retail sale", None),
        entry("CSH-5", date(2026, 10, 1), Out, whole(320), "USD", "Shipping deposit", None),
    ]
}
