//! Per-view reductions over a month of transactions.
//!
//! Every function is a single pass over its inputs and is recomputed on each
//! render; nothing here touches the store.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::icons::{FALLBACK_COLOR, FALLBACK_ICON};
use crate::models::{Category, PaymentMethod, Transaction, TransactionKind, UNCATEGORIZED};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub income: i64,
    pub expense: i64,
}

pub fn daily_totals(transactions: &[Transaction]) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for transaction in transactions {
        let totals = days.entry(transaction.date).or_default();
        match transaction.kind {
            TransactionKind::Income => totals.income += transaction.amount,
            TransactionKind::Expense => totals.expense += transaction.amount,
        }
    }
    days
}

fn expenses(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionKind::Expense)
}

/// Expense totals per referenced category id, dangling ids included.
pub fn spending_by_category(transactions: &[Transaction]) -> HashMap<i64, i64> {
    let mut spending = HashMap::new();
    for transaction in expenses(transactions) {
        if let Some(id) = transaction.category_id {
            *spending.entry(id).or_insert(0) += transaction.amount;
        }
    }
    spending
}

pub fn spending_by_payment_method(transactions: &[Transaction]) -> HashMap<i64, i64> {
    let mut spending = HashMap::new();
    for transaction in expenses(transactions) {
        if let Some(id) = transaction.payment_method_id {
            *spending.entry(id).or_insert(0) += transaction.amount;
        }
    }
    spending
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Safe,
    Warning,
    Danger,
}

impl BudgetStatus {
    /// A zero budget is never over; otherwise 70% warns and 100% is over.
    pub fn classify(spent: i64, budget: i64) -> Self {
        if budget == 0 {
            return BudgetStatus::Safe;
        }
        let ratio = spent as f64 / budget as f64;
        if ratio >= 1.0 {
            BudgetStatus::Danger
        } else if ratio >= 0.7 {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Safe => "safe",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRow<'a> {
    pub category: &'a Category,
    pub spent: i64,
    pub remaining: i64,
    /// Share of the budget used, capped at 100.
    pub percentage: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOverview<'a> {
    pub rows: Vec<BudgetRow<'a>>,
    pub total_budget: i64,
    pub total_spent: i64,
    pub remaining: i64,
}

pub fn budget_overview<'a>(
    categories: &'a [Category],
    spending: &HashMap<i64, i64>,
) -> BudgetOverview<'a> {
    let mut overview = BudgetOverview {
        rows: Vec::new(),
        total_budget: 0,
        total_spent: 0,
        remaining: 0,
    };
    for category in categories.iter().filter(|category| category.budget_amount > 0) {
        let spent = spending.get(&category.id).copied().unwrap_or(0);
        let budget = category.budget_amount;
        overview.total_budget += budget;
        overview.total_spent += spent;
        overview.rows.push(BudgetRow {
            category,
            spent,
            remaining: budget - spent,
            percentage: (spent as f64 * 100.0 / budget as f64).min(100.0),
            status: BudgetStatus::classify(spent, budget),
        });
    }
    overview.remaining = overview.total_budget - overview.total_spent;
    overview
}

/// One slice of a breakdown chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    /// `None` groups expenses that carry no reference at all.
    pub key: Option<i64>,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub amount: i64,
    pub percentage: i64,
}

fn uncategorized(key: Option<i64>, amount: i64) -> Breakdown {
    Breakdown {
        key,
        name: UNCATEGORIZED.to_string(),
        icon: FALLBACK_ICON.to_string(),
        color: FALLBACK_COLOR.to_string(),
        amount,
        percentage: 0,
    }
}

/// Sorts by amount descending and fills in rounded shares of the total.
fn finish(mut slices: Vec<Breakdown>) -> Vec<Breakdown> {
    let total: i64 = slices.iter().map(|slice| slice.amount).sum();
    slices.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));
    for slice in &mut slices {
        slice.percentage = share(slice.amount, total);
    }
    slices
}

pub fn share(amount: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (amount as f64 * 100.0 / total as f64).round() as i64
}

/// Expense breakdown by category. Expenses without a category and ids that no
/// longer resolve are reported as `미분류`.
pub fn category_stats(transactions: &[Transaction], categories: &[Category]) -> Vec<Breakdown> {
    let mut totals: HashMap<Option<i64>, i64> = HashMap::new();
    for transaction in expenses(transactions) {
        *totals.entry(transaction.category_id).or_insert(0) += transaction.amount;
    }
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    let slices = totals
        .into_iter()
        .map(|(key, amount)| match key.and_then(|id| by_id.get(&id)) {
            Some(category) => Breakdown {
                key,
                name: category.name.clone(),
                icon: category.icon.clone(),
                color: category.color.clone(),
                amount,
                percentage: 0,
            },
            None => uncategorized(key, amount),
        })
        .collect();
    finish(slices)
}

/// Expense breakdown by payment method; expenses without one are skipped.
pub fn payment_stats(transactions: &[Transaction], methods: &[PaymentMethod]) -> Vec<Breakdown> {
    let by_id: HashMap<i64, &PaymentMethod> = methods.iter().map(|m| (m.id, m)).collect();
    let slices = spending_by_payment_method(transactions)
        .into_iter()
        .map(|(id, amount)| match by_id.get(&id) {
            Some(method) => Breakdown {
                key: Some(id),
                name: method.name.clone(),
                icon: method.icon.clone(),
                color: method.color.clone(),
                amount,
                percentage: 0,
            },
            None => uncategorized(Some(id), amount),
        })
        .collect();
    finish(slices)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletRow<'a> {
    pub method: &'a PaymentMethod,
    pub spent: i64,
    /// Share of all spending attributed to a payment method, 0–100.
    pub ratio: f64,
}

/// Per-method spending plus the total attributed to any method.
pub fn wallet_rows<'a>(
    methods: &'a [PaymentMethod],
    spending: &HashMap<i64, i64>,
) -> (Vec<WalletRow<'a>>, i64) {
    let total: i64 = spending.values().sum();
    let rows = methods
        .iter()
        .map(|method| {
            let spent = spending.get(&method.id).copied().unwrap_or(0);
            let ratio = if total > 0 {
                spent as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            WalletRow { method, spent, ratio }
        })
        .collect();
    (rows, total)
}

/// Monthly charge of an installment plan, rounded up to the next won.
pub fn installment_monthly(amount: i64, months: u32) -> i64 {
    if months <= 1 || amount <= 0 {
        return amount;
    }
    (amount - 1) / i64::from(months) + 1
}
