//! Derived reads computed from the fixture collections.
//!
//! Aggregates are reported in [`BASE_CURRENCY`], converting foreign-currency
//! records with the fixture exchange rates. Cancelled orders never count.

use std::collections::BTreeMap;
use weft_core::entities::{
    AccountStatement, AccountType, CashBalance, CashDirection, ChequeStatus, DashboardSummary,
    MonthlySales, Order, OrderStatus, TopProduct,
};
use weft_core::Money;

use crate::set::{FixtureSet, BASE_CURRENCY};

/// Rows returned by `analytics:topProducts` without a `limit`.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

fn counts_as_sale(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

fn in_base(set: &FixtureSet, amount: Money, currency: &str) -> Money {
    set.rate(currency).convert(amount)
}

/// Ledger entries and running totals for one account.
pub fn statement(set: &FixtureSet, account_id: &str) -> Option<AccountStatement> {
    let account = set.account(account_id)?.clone();
    let entries: Vec<_> = set
        .ledger
        .iter()
        .filter(|e| e.account_id == account_id)
        .cloned()
        .collect();
    let total_debit: Money = entries.iter().map(|e| e.debit).sum();
    let total_credit: Money = entries.iter().map(|e| e.credit).sum();
    Some(AccountStatement {
        account,
        entries,
        total_debit,
        total_credit,
        balance: total_debit - total_credit,
    })
}

/// Register totals per currency, ordered by currency code.
pub fn cash_balance(set: &FixtureSet) -> Vec<CashBalance> {
    let mut totals: BTreeMap<&str, (Money, Money)> = BTreeMap::new();
    for entry in &set.cash {
        let slot = totals.entry(entry.currency.as_str()).or_default();
        match entry.direction {
            CashDirection::In => slot.0 = slot.0 + entry.amount,
            CashDirection::Out => slot.1 = slot.1 + entry.amount,
        }
    }
    totals
        .into_iter()
        .map(|(currency, (total_in, total_out))| CashBalance {
            currency: currency.to_string(),
            total_in,
            total_out,
            balance: total_in - total_out,
        })
        .collect()
}

/// Headline figures for the landing screen.
pub fn dashboard(set: &FixtureSet) -> DashboardSummary {
    let total_receivables = set
        .accounts
        .iter()
        .filter(|a| a.account_type == AccountType::Customer && a.balance.is_positive())
        .map(|a| in_base(set, a.balance, &a.currency))
        .sum();

    let total_payables = set
        .accounts
        .iter()
        .filter(|a| a.account_type != AccountType::Customer && a.balance < Money::ZERO)
        .map(|a| in_base(set, Money::ZERO - a.balance, &a.currency))
        .sum();

    let open_orders = set
        .orders
        .iter()
        .filter(|o| {
            matches!(
                o.status,
                OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Shipped
            )
        })
        .count() as u32;

    let low_stock_items = set
        .stock
        .iter()
        .filter(|s| s.quantity < s.min_quantity)
        .count() as u32;

    let cheques_in_portfolio = set
        .cheques
        .iter()
        .filter(|c| c.status == ChequeStatus::Portfolio)
        .map(|c| in_base(set, c.amount, &c.currency))
        .sum();

    let latest_month = set
        .orders
        .iter()
        .filter(|o| counts_as_sale(o))
        .map(|o| month_of(o))
        .max();
    let monthly_sales = match latest_month {
        Some(month) => sales_by_month(set, None)
            .into_iter()
            .find(|m| m.month == month)
            .map(|m| m.total)
            .unwrap_or(Money::ZERO),
        None => Money::ZERO,
    };

    DashboardSummary {
        total_receivables,
        total_payables,
        open_orders,
        low_stock_items,
        cheques_in_portfolio,
        monthly_sales,
    }
}

fn month_of(order: &Order) -> String {
    order.date.format("%Y-%m").to_string()
}

/// Order totals grouped by calendar month, oldest first.
pub fn sales_by_month(set: &FixtureSet, year: Option<i32>) -> Vec<MonthlySales> {
    use chrono::Datelike;

    let mut months: BTreeMap<String, (Money, u32)> = BTreeMap::new();
    for order in set.orders.iter().filter(|o| counts_as_sale(o)) {
        if year.is_some_and(|y| order.date.year() != y) {
            continue;
        }
        let slot = months.entry(month_of(order)).or_default();
        slot.0 = slot.0 + in_base(set, order.total, &order.currency);
        slot.1 += 1;
    }
    months
        .into_iter()
        .map(|(month, (total, order_count))| MonthlySales {
            month,
            total,
            order_count,
        })
        .collect()
}

/// Best-selling products by quantity, revenue breaking ties.
pub fn top_products(set: &FixtureSet, limit: usize) -> Vec<TopProduct> {
    let mut by_product: BTreeMap<&str, (i64, Money)> = BTreeMap::new();
    for order in set.orders.iter().filter(|o| counts_as_sale(o)) {
        for line in &order.lines {
            let revenue = Money::from_minor(line.unit_price.minor() * line.quantity);
            let slot = by_product.entry(line.product_id.as_str()).or_default();
            slot.0 += line.quantity;
            slot.1 = slot.1 + in_base(set, revenue, &order.currency);
        }
    }

    let mut ranked: Vec<TopProduct> = by_product
        .into_iter()
        .map(|(product_id, (quantity, revenue))| TopProduct {
            product_id: product_id.to_string(),
            product_name: set
                .product(product_id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            quantity,
            revenue,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_balances_match_accounts() {
        let set = FixtureSet::demo();
        for account in &set.accounts {
            let statement = statement(&set, &account.id).unwrap();
            assert_eq!(statement.balance, account.balance, "account {}", account.id);
        }
        assert!(statement(&set, "missing").is_none());
    }

    #[test]
    fn test_cash_balance_per_currency() {
        let set = FixtureSet::demo();
        let balances = cash_balance(&set);
        let currencies: Vec<_> = balances.iter().map(|b| b.currency.as_str()).collect();
        assert_eq!(currencies, vec!["TRY", "USD"]);
        for b in &balances {
            assert_eq!(b.balance, b.total_in - b.total_out);
        }
    }

    #[test]
    fn test_dashboard_counts() {
        let set = FixtureSet::demo();
        let summary = dashboard(&set);
        let open = set
            .orders
            .iter()
            .filter(|o| {
                !matches!(o.status, OrderStatus::Delivered | OrderStatus::Cancelled)
            })
            .count() as u32;
        assert_eq!(summary.open_orders, open);
        assert_eq!(summary.low_stock_items, 2);
        assert!(summary.total_receivables.is_positive());
        assert!(summary.total_payables.is_positive());
        assert!(summary.monthly_sales.is_positive());
    }

    #[test]
    fn test_sales_by_month_ordered_and_filtered() {
        let set = FixtureSet::demo();
        let all = sales_by_month(&set, None);
        let months: Vec<_> = all.iter().map(|m| m.month.clone()).collect();
        let mut sorted = months.clone();
        sorted.sort();
        assert_eq!(months, sorted);
        assert!(sales_by_month(&set, Some(1999)).is_empty());
    }

    #[test]
    fn test_top_products_limit_and_order() {
        let set = FixtureSet::demo();
        let top = top_products(&set, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].quantity >= w[1].quantity));
        assert!(top.iter().all(|p| !p.product_name.is_empty()));
    }
}
