//! View models for the templates. Every amount is formatted here so the
//! templates only place strings.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::{
    Breakdown, BudgetStatus, budget_overview, category_stats, daily_totals,
    installment_monthly, payment_stats, spending_by_category, spending_by_payment_method,
    wallet_rows,
};
use crate::format::{
    day_label, days_in_month, first_weekday, format_compact, format_currency, format_date,
    format_man_won, month_title, shift_month, weekday_index, weekday_name,
};
use crate::forms::{INSTALLMENT_OPTIONS, LAST_DAY_LABEL, TransactionForm};
use crate::holidays::holidays_for_year;
use crate::icons::{CATEGORY_COLORS, DEFAULT_CATEGORY_ICON, FALLBACK_COLOR, FALLBACK_ICON, glyph};
use crate::models::{
    BillingCycle, Category, FixedExpense, PaymentMethod, PaymentMethodType, Transaction,
    TransactionKind, UNCATEGORIZED,
};
use crate::queries::monthly_stats;

const TOP_LEGEND: usize = 5;

#[derive(Debug, Serialize)]
pub struct MonthNav {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub prev_year: i32,
    pub prev_month: u32,
    pub next_year: i32,
    pub next_month: u32,
}

pub fn month_nav(year: i32, month: u32) -> MonthNav {
    let (prev_year, prev_month) = shift_month(year, month, -1);
    let (next_year, next_month) = shift_month(year, month, 1);
    MonthNav {
        year,
        month,
        title: month_title(year, month),
        prev_year,
        prev_month,
        next_year,
        next_month,
    }
}

/// `sun` for Sundays and holidays, `sat` for Saturdays.
fn tone(weekday: u32, holiday: bool) -> &'static str {
    if weekday == 0 || holiday {
        "sun"
    } else if weekday == 6 {
        "sat"
    } else {
        ""
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub balance_negative: bool,
}

#[derive(Debug, Serialize)]
pub struct WeekdayHeader {
    pub name: &'static str,
    pub tone: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CalendarCell {
    pub day: u32,
    pub date: String,
    pub tone: &'static str,
    pub is_today: bool,
    pub is_selected: bool,
    pub holiday: Option<&'static str>,
    pub income: Option<String>,
    pub expense: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub kind: TransactionKind,
    pub title: String,
    pub subtitle: String,
    pub amount: String,
    pub glyph: String,
    pub color: String,
    pub installment: Option<String>,
    pub is_fixed: bool,
}

#[derive(Debug, Serialize)]
pub struct DayDetailView {
    pub date: String,
    pub label: String,
    pub weekday: String,
    pub tone: &'static str,
    pub income: Option<String>,
    pub expense: Option<String>,
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Serialize)]
pub struct CalendarView {
    pub nav: MonthNav,
    pub summary: SummaryView,
    pub weekdays: Vec<WeekdayHeader>,
    pub padding: Vec<u32>,
    pub cells: Vec<CalendarCell>,
    pub selected: Option<DayDetailView>,
}

pub fn transaction_view(transaction: &Transaction) -> TransactionView {
    let (icon, color) = transaction
        .category
        .as_ref()
        .map(|category| (category.icon.as_str(), category.color.as_str()))
        .unwrap_or((FALLBACK_ICON, FALLBACK_COLOR));
    let method_name = transaction
        .payment_method
        .as_ref()
        .map(|method| method.name.as_str())
        .unwrap_or("");
    let subtitle = match transaction.memo.as_deref().filter(|memo| !memo.is_empty()) {
        Some(memo) if method_name.is_empty() => memo.to_string(),
        Some(memo) => format!("{method_name} · {memo}"),
        None => method_name.to_string(),
    };
    let sign = match transaction.kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    TransactionView {
        id: transaction.id,
        kind: transaction.kind,
        title: transaction.title().to_string(),
        subtitle,
        amount: format!("{sign}{}", format_currency(transaction.amount)),
        glyph: glyph(icon).to_string(),
        color: color.to_string(),
        installment: transaction.installment_months.filter(|m| *m > 1).map(|months| {
            format!(
                "월 {} × {months}개월",
                format_currency(installment_monthly(transaction.amount, months))
            )
        }),
        is_fixed: transaction.is_fixed,
    }
}

fn day_detail(date: NaiveDate, holiday: bool, transactions: &[Transaction]) -> DayDetailView {
    let of_day: Vec<&Transaction> = transactions.iter().filter(|t| t.date == date).collect();
    let mut income = 0;
    let mut expense = 0;
    for transaction in &of_day {
        match transaction.kind {
            TransactionKind::Income => income += transaction.amount,
            TransactionKind::Expense => expense += transaction.amount,
        }
    }
    let weekday = weekday_index(date);
    DayDetailView {
        date: format_date(date),
        label: day_label(date),
        weekday: format!("{}요일", weekday_name(weekday)),
        tone: tone(weekday, holiday),
        income: (income > 0).then(|| format_currency(income)),
        expense: (expense > 0).then(|| format_currency(expense)),
        transactions: of_day.into_iter().map(transaction_view).collect(),
    }
}

pub fn calendar_view(
    year: i32,
    month: u32,
    today: NaiveDate,
    selected: Option<NaiveDate>,
    transactions: &[Transaction],
) -> CalendarView {
    let stats = monthly_stats(transactions);
    let totals = daily_totals(transactions);
    let holidays = holidays_for_year(year);
    let first = first_weekday(year, month);

    let cells = (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| {
            let holiday = holidays.get(&date).map(|holiday| holiday.name);
            let day_totals = totals.get(&date).copied().unwrap_or_default();
            CalendarCell {
                day: date.day(),
                date: format_date(date),
                tone: tone(weekday_index(date), holiday.is_some()),
                is_today: date == today,
                is_selected: Some(date) == selected,
                holiday,
                income: (day_totals.income > 0)
                    .then(|| format!("+{}", format_compact(day_totals.income))),
                expense: (day_totals.expense > 0)
                    .then(|| format!("-{}", format_compact(day_totals.expense))),
            }
        })
        .collect();

    let selected = selected
        .filter(|date| date.year() == year && date.month() == month)
        .map(|date| day_detail(date, holidays.contains_key(&date), transactions));

    CalendarView {
        nav: month_nav(year, month),
        summary: SummaryView {
            income: format_currency(stats.income),
            expense: format_currency(stats.expense),
            balance: format_currency(stats.balance.abs()),
            balance_negative: stats.balance < 0,
        },
        weekdays: (0..7)
            .map(|index| WeekdayHeader {
                name: weekday_name(index),
                tone: tone(index, false),
            })
            .collect(),
        padding: (0..first).collect(),
        cells,
        selected,
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetRowView {
    pub id: i64,
    pub name: String,
    pub glyph: String,
    pub color: String,
    pub budget: String,
    pub spent: String,
    pub remaining: String,
    pub over: bool,
    pub percentage: i64,
    pub width: String,
    pub status: BudgetStatus,
}

#[derive(Debug, Serialize)]
pub struct CategoryItemView {
    pub id: i64,
    pub name: String,
    pub glyph: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct FixedExpenseView {
    pub id: i64,
    pub description: String,
    pub amount: String,
    pub due: String,
    pub detail: String,
    pub glyph: String,
    pub color: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct BudgetPageView {
    pub nav: MonthNav,
    pub total_budget: String,
    pub total_spent: String,
    pub remaining: String,
    pub over: bool,
    pub rows: Vec<BudgetRowView>,
    pub categories: Vec<CategoryItemView>,
    pub fixed_expenses: Vec<FixedExpenseView>,
    pub fixed_total: String,
    pub has_active_fixed: bool,
}

fn category_item(category: &Category) -> CategoryItemView {
    CategoryItemView {
        id: category.id,
        name: category.name.clone(),
        glyph: glyph(&category.icon).to_string(),
        color: category.color.clone(),
    }
}

pub fn fixed_expense_view(expense: &FixedExpense) -> FixedExpenseView {
    let (icon, color) = expense
        .category
        .as_ref()
        .map(|category| (category.icon.as_str(), category.color.as_str()))
        .unwrap_or((FALLBACK_ICON, FALLBACK_COLOR));
    let category_name = expense
        .category
        .as_ref()
        .map(|category| category.name.as_str())
        .unwrap_or(UNCATEGORIZED);
    let detail = match expense.payment_method.as_ref() {
        Some(method) => format!("{category_name} · {}", method.name),
        None => category_name.to_string(),
    };
    FixedExpenseView {
        id: expense.id,
        description: expense.description.clone(),
        amount: format_currency(expense.amount),
        due: expense
            .due_day
            .map(|day| format!("매월 {day}일"))
            .unwrap_or_default(),
        detail,
        glyph: glyph(icon).to_string(),
        color: color.to_string(),
        is_active: expense.is_active,
    }
}

pub fn budget_page(
    year: i32,
    month: u32,
    categories: &[Category],
    transactions: &[Transaction],
    fixed_expenses: &[FixedExpense],
) -> BudgetPageView {
    let spending = spending_by_category(transactions);
    let overview = budget_overview(categories, &spending);
    let rows = overview
        .rows
        .iter()
        .map(|row| BudgetRowView {
            id: row.category.id,
            name: row.category.name.clone(),
            glyph: glyph(&row.category.icon).to_string(),
            color: row.category.color.clone(),
            budget: format_currency(row.category.budget_amount),
            spent: format_currency(row.spent),
            remaining: format_currency(row.remaining),
            over: row.remaining < 0,
            percentage: row.percentage.round() as i64,
            width: format!("{:.1}", row.percentage),
            status: row.status,
        })
        .collect();
    let fixed_total: i64 = fixed_expenses
        .iter()
        .filter(|expense| expense.is_active)
        .map(|expense| expense.amount)
        .sum();

    BudgetPageView {
        nav: month_nav(year, month),
        total_budget: format_currency(overview.total_budget),
        total_spent: format_currency(overview.total_spent),
        remaining: format_currency(overview.remaining.abs()),
        over: overview.remaining < 0,
        rows,
        categories: categories.iter().map(category_item).collect(),
        fixed_expenses: fixed_expenses.iter().map(fixed_expense_view).collect(),
        fixed_total: format_currency(fixed_total),
        has_active_fixed: fixed_expenses.iter().any(|expense| expense.is_active),
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetDraftView {
    pub id: i64,
    pub name: String,
    pub glyph: String,
    pub color: String,
    pub value: String,
}

/// Edit-mode drafts: the current budget, blank when unset or after a reset.
pub fn budget_drafts(categories: &[Category], reset: bool) -> Vec<BudgetDraftView> {
    categories
        .iter()
        .map(|category| BudgetDraftView {
            id: category.id,
            name: category.name.clone(),
            glyph: glyph(&category.icon).to_string(),
            color: category.color.clone(),
            value: if reset || category.budget_amount == 0 {
                String::new()
            } else {
                category.budget_amount.to_string()
            },
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct WalletCardView {
    pub id: i64,
    pub name: String,
    pub type_label: &'static str,
    pub glyph: String,
    pub color: String,
    pub billing: Option<String>,
    pub spent: String,
    pub width: String,
}

#[derive(Debug, Serialize)]
pub struct WalletPageView {
    pub nav: MonthNav,
    pub total: String,
    pub methods: Vec<WalletCardView>,
}

/// `매월 14일 결제 (1일~말일 사용분)`; either half is left out when unset.
pub fn billing_description(kind: PaymentMethodType, billing: &BillingCycle) -> Option<String> {
    if kind != PaymentMethodType::Card {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(day) = billing.billing_day {
        parts.push(format!("매월 {day}일 결제"));
    }
    if let (Some(start), Some(end)) = (billing.start_day, billing.end_day) {
        let end = if end == 0 {
            LAST_DAY_LABEL.to_string()
        } else {
            format!("{end}일")
        };
        parts.push(format!("({start}일~{end} 사용분)"));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

pub fn wallet_page(
    year: i32,
    month: u32,
    methods: &[PaymentMethod],
    transactions: &[Transaction],
) -> WalletPageView {
    let spending = spending_by_payment_method(transactions);
    let (rows, total) = wallet_rows(methods, &spending);
    WalletPageView {
        nav: month_nav(year, month),
        total: format_currency(total),
        methods: rows
            .into_iter()
            .map(|row| WalletCardView {
                id: row.method.id,
                name: row.method.name.clone(),
                type_label: row.method.kind.label(),
                glyph: glyph(&row.method.icon).to_string(),
                color: row.method.color.clone(),
                billing: billing_description(row.method.kind, &row.method.billing),
                spent: format_currency(row.spent),
                width: format!("{:.1}", row.ratio),
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct BreakdownView {
    pub name: String,
    pub glyph: String,
    pub color: String,
    pub amount: String,
    pub percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsPageView {
    pub nav: MonthNav,
    pub title: String,
    pub income: String,
    pub expense: String,
    pub donut_center: String,
    pub donut: String,
    pub top: Vec<BreakdownView>,
    pub categories: Vec<BreakdownView>,
    pub payments: Vec<BreakdownView>,
}

fn breakdown_view(slice: &Breakdown) -> BreakdownView {
    BreakdownView {
        name: slice.name.clone(),
        glyph: glyph(&slice.icon).to_string(),
        color: slice.color.clone(),
        amount: format_currency(slice.amount),
        percentage: slice.percentage,
    }
}

/// CSS `conic-gradient` stops for the category donut.
fn donut_gradient(slices: &[Breakdown]) -> String {
    let total: i64 = slices.iter().map(|slice| slice.amount).sum();
    if total == 0 {
        return String::new();
    }
    let mut start = 0.0;
    let mut stops = Vec::with_capacity(slices.len());
    for slice in slices {
        let end = start + slice.amount as f64 * 100.0 / total as f64;
        stops.push(format!("{} {start:.2}% {end:.2}%", slice.color));
        start = end;
    }
    stops.join(", ")
}

pub fn stats_page(
    year: i32,
    month: u32,
    categories: &[Category],
    methods: &[PaymentMethod],
    transactions: &[Transaction],
) -> StatsPageView {
    let stats = monthly_stats(transactions);
    let by_category = category_stats(transactions, categories);
    let by_payment = payment_stats(transactions, methods);
    let total_expense: i64 = by_category.iter().map(|slice| slice.amount).sum();
    StatsPageView {
        nav: month_nav(year, month),
        title: format!("{month}월 통계"),
        income: format_currency(stats.income),
        expense: format_currency(total_expense),
        donut_center: format_man_won(total_expense),
        donut: donut_gradient(&by_category),
        top: by_category.iter().take(TOP_LEGEND).map(breakdown_view).collect(),
        categories: by_category.iter().map(breakdown_view).collect(),
        payments: by_payment.iter().map(breakdown_view).collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentOptionView {
    pub id: i64,
    pub name: String,
    pub is_card: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct TransactionFormView {
    pub kind: TransactionKind,
    pub date: String,
    pub amount: String,
    pub description: String,
    pub memo: String,
    pub is_fixed: bool,
    pub category_id: Option<i64>,
    pub categories: Vec<CategoryItemView>,
    pub payment_methods: Vec<PaymentOptionView>,
    pub card_selected: bool,
    pub installments: Vec<OptionView>,
    pub error: Option<String>,
}

pub fn transaction_form(
    kind: TransactionKind,
    date: NaiveDate,
    payment_method_id: Option<i64>,
    categories: &[Category],
    methods: &[PaymentMethod],
    error: Option<String>,
) -> TransactionFormView {
    let payment_methods: Vec<PaymentOptionView> = methods
        .iter()
        .map(|method| PaymentOptionView {
            id: method.id,
            name: method.name.clone(),
            is_card: method.is_card(),
            selected: Some(method.id) == payment_method_id,
        })
        .collect();
    let card_selected = payment_methods
        .iter()
        .any(|method| method.selected && method.is_card);
    TransactionFormView {
        kind,
        date: format_date(date),
        amount: String::new(),
        description: String::new(),
        memo: String::new(),
        is_fixed: false,
        category_id: None,
        categories: categories
            .iter()
            .filter(|category| category.matches_kind(kind))
            .map(category_item)
            .collect(),
        payment_methods,
        card_selected: card_selected && kind == TransactionKind::Expense,
        installments: INSTALLMENT_OPTIONS
            .iter()
            .map(|months| OptionView {
                value: months.to_string(),
                label: if *months == 1 {
                    "일시불".to_string()
                } else {
                    format!("{months}개월")
                },
                selected: *months == 1,
            })
            .collect(),
        error,
    }
}

impl TransactionFormView {
    /// Carries the submitted values back into a redrawn form.
    pub fn keep_input(&mut self, form: &TransactionForm) {
        self.amount = form.amount.clone();
        self.description = form.description.clone().unwrap_or_default();
        self.memo = form.memo.clone().unwrap_or_default();
        self.is_fixed = form.is_fixed && self.kind == TransactionKind::Expense;
        self.category_id = form
            .category_id
            .filter(|id| self.categories.iter().any(|category| category.id == *id));
        if let Some(months) = form.installment_months {
            let months = months.to_string();
            if self.installments.iter().any(|option| option.value == months) {
                for option in &mut self.installments {
                    option.selected = option.value == months;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryFormView {
    pub id: Option<i64>,
    pub name: String,
    pub icon: String,
    pub palette: Vec<OptionView>,
    pub error: Option<String>,
}

pub fn category_form(existing: Option<&Category>, error: Option<String>) -> CategoryFormView {
    let color = existing
        .map(|category| category.color.as_str())
        .unwrap_or(FALLBACK_COLOR);
    CategoryFormView {
        id: existing.map(|category| category.id),
        name: existing.map(|category| category.name.clone()).unwrap_or_default(),
        icon: existing
            .map(|category| glyph(&category.icon).to_string())
            .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        palette: CATEGORY_COLORS
            .iter()
            .map(|candidate| OptionView {
                value: candidate.to_string(),
                label: candidate.to_string(),
                selected: *candidate == color,
            })
            .collect(),
        error,
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodFormView {
    pub id: Option<i64>,
    pub name: String,
    pub types: Vec<OptionView>,
    pub is_card: bool,
    pub billing_day: String,
    pub start_days: Vec<OptionView>,
    pub end_days: Vec<OptionView>,
    pub error: Option<String>,
}

fn day_options(selected: Option<u32>, with_last_day: bool) -> Vec<OptionView> {
    let mut options = vec![OptionView {
        value: String::new(),
        label: "선택".to_string(),
        selected: selected.is_none(),
    }];
    options.extend((1..=31).map(|day| OptionView {
        value: day.to_string(),
        label: format!("{day}일"),
        selected: selected == Some(day),
    }));
    if with_last_day {
        options.push(OptionView {
            value: LAST_DAY_LABEL.to_string(),
            label: LAST_DAY_LABEL.to_string(),
            selected: selected == Some(0),
        });
    }
    options
}

pub fn payment_method_form(
    existing: Option<&PaymentMethod>,
    error: Option<String>,
) -> PaymentMethodFormView {
    let kind = existing
        .map(|method| method.kind)
        .unwrap_or(PaymentMethodType::Card);
    let billing = existing.map(|method| method.billing).unwrap_or_default();
    PaymentMethodFormView {
        id: existing.map(|method| method.id),
        name: existing.map(|method| method.name.clone()).unwrap_or_default(),
        types: PaymentMethodType::ALL
            .iter()
            .map(|candidate| OptionView {
                value: candidate.as_str().to_string(),
                label: candidate.label().to_string(),
                selected: *candidate == kind,
            })
            .collect(),
        is_card: kind == PaymentMethodType::Card,
        billing_day: billing
            .billing_day
            .map(|day| day.to_string())
            .unwrap_or_default(),
        start_days: day_options(billing.start_day, false),
        end_days: day_options(billing.end_day, true),
        error,
    }
}
