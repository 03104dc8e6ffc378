use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;

pub const UNCATEGORIZED: &str = "미분류";
pub const INCOME_CATEGORY_NAMES: [&str; 2] = ["급여", "기타수입"];
pub const DEFAULT_FIXED_DESCRIPTION: &str = "반복 지출";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(AppError::Invalid(format!("알 수 없는 거래 유형입니다: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodType {
    Card,
    Bank,
    Cash,
    Other,
}

impl PaymentMethodType {
    pub const ALL: [PaymentMethodType; 4] = [
        PaymentMethodType::Card,
        PaymentMethodType::Bank,
        PaymentMethodType::Cash,
        PaymentMethodType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "card",
            PaymentMethodType::Bank => "bank",
            PaymentMethodType::Cash => "cash",
            PaymentMethodType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "카드",
            PaymentMethodType::Bank => "은행",
            PaymentMethodType::Cash => "현금",
            PaymentMethodType::Other => "기타",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "#3B82F6",
            PaymentMethodType::Bank => "#10B981",
            PaymentMethodType::Cash => "#22C55E",
            PaymentMethodType::Other => "#6B7280",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "credit-card",
            PaymentMethodType::Bank => "wallet",
            PaymentMethodType::Cash => "banknote",
            PaymentMethodType::Other => "circle",
        }
    }
}

impl FromStr for PaymentMethodType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PaymentMethodType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::Invalid(format!("알 수 없는 결제 수단 종류입니다: {value}")))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub budget_amount: i64,
    pub is_default: bool,
    pub created_at: String,
}

impl Category {
    pub fn is_income(&self) -> bool {
        INCOME_CATEGORY_NAMES.contains(&self.name.as_str())
    }

    /// Income categories are offered for income, every other one for expenses.
    pub fn matches_kind(&self, kind: TransactionKind) -> bool {
        match kind {
            TransactionKind::Income => self.is_income(),
            TransactionKind::Expense => !self.is_income(),
        }
    }
}

/// Card-only billing settings; absent for every other type.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct BillingCycle {
    pub billing_day: Option<u32>,
    pub start_day: Option<u32>,
    /// `Some(0)` means the last day of the month.
    pub end_day: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentMethod {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: PaymentMethodType,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
    pub billing: BillingCycle,
    pub created_at: String,
}

impl PaymentMethod {
    pub fn is_card(&self) -> bool {
        self.kind == PaymentMethodType::Card
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub amount: i64,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub description: Option<String>,
    pub memo: Option<String>,
    pub date: NaiveDate,
    pub is_fixed: bool,
    pub installment_months: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
}

impl Transaction {
    /// Description, else the category name, else `미분류`.
    pub fn title(&self) -> &str {
        self.description
            .as_deref()
            .filter(|text| !text.is_empty())
            .or_else(|| self.category.as_ref().map(|category| category.name.as_str()))
            .unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FixedExpense {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub description: String,
    pub amount: i64,
    pub due_day: Option<u32>,
    pub is_active: bool,
    pub created_at: String,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub budget_amount: i64,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub name: String,
    pub kind: PaymentMethodType,
    pub is_default: bool,
    pub billing: BillingCycle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: i64,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub description: Option<String>,
    pub memo: Option<String>,
    pub date: NaiveDate,
    pub is_fixed: bool,
    pub installment_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFixedExpense {
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub description: String,
    pub amount: i64,
    pub due_day: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct MonthlyStats {
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}
