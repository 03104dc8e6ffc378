//! Form bodies posted by the modal pages and their validation into drafts.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::icons::{DEFAULT_CATEGORY_ICON, FALLBACK_COLOR, is_palette_color, last_grapheme};
use crate::models::{
    BillingCycle, Category, NewCategory, NewPaymentMethod, NewTransaction, PaymentMethod,
    PaymentMethodType, TransactionKind,
};

pub const INSTALLMENT_OPTIONS: [u32; 6] = [1, 2, 3, 6, 12, 24];
pub const LAST_DAY_LABEL: &str = "말일";

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, FromForm)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, FromForm)]
pub struct TransactionForm {
    pub kind: String,
    pub amount: String,
    pub date: String,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub installment_months: Option<u32>,
    pub description: Option<String>,
    pub memo: Option<String>,
    pub is_fixed: bool,
}

#[derive(Debug, FromForm)]
pub struct CategoryForm {
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, FromForm)]
pub struct BudgetForm {
    pub budgets: HashMap<i64, String>,
}

#[derive(Debug, FromForm)]
pub struct PaymentMethodForm {
    pub name: String,
    pub kind: String,
    pub billing_day: Option<String>,
    pub billing_start_day: Option<String>,
    pub billing_end_day: Option<String>,
}

fn invalid(message: &str) -> AppError {
    AppError::Invalid(message.to_string())
}

/// Largest amount a single transaction or budget may carry.
pub const MAX_AMOUNT: i64 = 999_999_999_999;

const AMOUNT_REQUIRED: &str = "금액을 입력해주세요.";
const AMOUNT_TOO_LARGE: &str = "금액은 999,999,999,999원 이하로 입력해주세요.";
const BUDGET_INVALID: &str = "예산은 0 이상의 숫자로 입력해주세요.";

enum AmountProblem {
    Malformed,
    TooLarge,
}

fn whole_won(input: &str) -> Result<i64, AmountProblem> {
    let cleaned: String = input
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(AmountProblem::Malformed);
    }
    // only digits remain, so a parse failure means the value overflowed
    match cleaned.parse::<i64>() {
        Ok(0) => Err(AmountProblem::Malformed),
        Ok(amount) if amount <= MAX_AMOUNT => Ok(amount),
        _ => Err(AmountProblem::TooLarge),
    }
}

/// Whole won, commas and spaces allowed; zero, signs and anything above
/// [`MAX_AMOUNT`] are rejected.
pub fn parse_amount(input: &str) -> AppResult<i64> {
    whole_won(input).map_err(|problem| match problem {
        AmountProblem::Malformed => invalid(AMOUNT_REQUIRED),
        AmountProblem::TooLarge => invalid(AMOUNT_TOO_LARGE),
    })
}

/// Budget draft value: blank means unset (0).
pub fn parse_budget(input: &str) -> AppResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Ok(0);
    }
    whole_won(trimmed).map_err(|problem| match problem {
        AmountProblem::Malformed => invalid(BUDGET_INVALID),
        AmountProblem::TooLarge => invalid(AMOUNT_TOO_LARGE),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}

impl TransactionForm {
    /// Builds the insert payload. Installments survive only for a card expense
    /// with more than one month, and income is never recurring.
    pub fn validate(&self, methods: &[PaymentMethod]) -> AppResult<NewTransaction> {
        let kind: TransactionKind = self.kind.parse()?;
        let amount = parse_amount(&self.amount)?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| invalid("날짜 형식이 올바르지 않습니다."))?;

        let is_card = self
            .payment_method_id
            .and_then(|id| methods.iter().find(|method| method.id == id))
            .is_some_and(PaymentMethod::is_card);
        let installment_months = self
            .installment_months
            .filter(|months| INSTALLMENT_OPTIONS.contains(months) && *months > 1)
            .filter(|_| is_card && kind == TransactionKind::Expense);

        Ok(NewTransaction {
            kind,
            amount,
            category_id: self.category_id,
            payment_method_id: self.payment_method_id,
            description: non_empty(self.description.as_deref()),
            memo: non_empty(self.memo.as_deref()),
            date,
            is_fixed: self.is_fixed && kind == TransactionKind::Expense,
            installment_months,
        })
    }
}

impl CategoryForm {
    pub fn validate(&self) -> AppResult<NewCategory> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("카테고리 이름을 입력해주세요."));
        }
        let icon = last_grapheme(&self.icon).unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string());
        let color = if is_palette_color(&self.color) {
            self.color.clone()
        } else {
            FALLBACK_COLOR.to_string()
        };
        Ok(NewCategory {
            name: name.to_string(),
            icon,
            color,
            budget_amount: 0,
            is_default: false,
        })
    }
}

impl BudgetForm {
    /// `(category id, new budget)` for every category whose value changed.
    pub fn changes(&self, categories: &[Category]) -> AppResult<Vec<(i64, i64)>> {
        let mut out = Vec::new();
        for category in categories {
            let draft = self.budgets.get(&category.id).map(String::as_str).unwrap_or("");
            let budget = parse_budget(draft)?;
            if budget != category.budget_amount {
                out.push((category.id, budget));
            }
        }
        Ok(out)
    }
}

fn parse_day(value: Option<&str>, max: u32, message: &str) -> AppResult<Option<u32>> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(day) if (1..=max).contains(&day) => Ok(Some(day)),
        _ => Err(invalid(message)),
    }
}

impl PaymentMethodForm {
    pub fn validate(&self) -> AppResult<NewPaymentMethod> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("결제 수단 이름을 입력해주세요."));
        }
        let kind: PaymentMethodType = self.kind.parse()?;
        let billing = if kind == PaymentMethodType::Card {
            let end_day = match non_empty(self.billing_end_day.as_deref()) {
                Some(raw) if raw == LAST_DAY_LABEL || raw == "0" => Some(0),
                Some(raw) => parse_day(Some(&raw), 31, "사용 기간 종료일이 올바르지 않습니다.")?,
                None => None,
            };
            BillingCycle {
                billing_day: parse_day(
                    self.billing_day.as_deref(),
                    28,
                    "결제일은 1일부터 28일 사이여야 합니다.",
                )?,
                start_day: parse_day(
                    self.billing_start_day.as_deref(),
                    31,
                    "사용 기간 시작일이 올바르지 않습니다.",
                )?,
                end_day,
            }
        } else {
            BillingCycle::default()
        };
        Ok(NewPaymentMethod {
            name: name.to_string(),
            kind,
            is_default: false,
            billing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64) -> PaymentMethod {
        PaymentMethod {
            id,
            user_id: 1,
            name: "카드".into(),
            kind: PaymentMethodType::Card,
            color: "#3B82F6".into(),
            icon: "credit-card".into(),
            is_default: false,
            billing: BillingCycle::default(),
            created_at: String::new(),
        }
    }

    fn cash(id: i64) -> PaymentMethod {
        PaymentMethod {
            kind: PaymentMethodType::Cash,
            ..card(id)
        }
    }

    fn transaction_form() -> TransactionForm {
        TransactionForm {
            kind: "expense".into(),
            amount: "50,000".into(),
            date: "2025-03-25".into(),
            category_id: Some(1),
            payment_method_id: Some(10),
            installment_months: Some(3),
            description: Some("  넷플릭스 ".into()),
            memo: Some("".into()),
            is_fixed: true,
        }
    }

    #[test]
    fn amounts_must_be_positive_whole_won() {
        assert_eq!(parse_amount("1,000").unwrap(), 1000);
        assert_eq!(parse_amount(" 25000 ").unwrap(), 25000);
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-500").is_err());
        assert!(parse_amount("+500").is_err());
        assert!(parse_amount("12.5").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn amounts_are_capped() {
        assert_eq!(parse_amount("999,999,999,999").unwrap(), MAX_AMOUNT);
        let over = parse_amount("1,000,000,000,000").unwrap_err();
        assert_eq!(over.to_string(), "금액은 999,999,999,999원 이하로 입력해주세요.");
        let overflow = parse_amount("9223372036854775808").unwrap_err();
        assert_eq!(overflow.to_string(), "금액은 999,999,999,999원 이하로 입력해주세요.");
        assert_eq!(parse_amount("abc").unwrap_err().to_string(), "금액을 입력해주세요.");
    }

    #[test]
    fn budgets_share_the_amount_cap() {
        assert_eq!(parse_budget("").unwrap(), 0);
        assert_eq!(parse_budget("300,000").unwrap(), 300_000);
        assert_eq!(parse_budget("-5").unwrap_err().to_string(), "예산은 0 이상의 숫자로 입력해주세요.");
        assert!(parse_budget("9223372036854775807").is_err());
    }

    #[test]
    fn card_expense_keeps_installments() {
        let draft = transaction_form().validate(&[card(10)]).unwrap();
        assert_eq!(draft.amount, 50_000);
        assert_eq!(draft.installment_months, Some(3));
        assert_eq!(draft.description.as_deref(), Some("넷플릭스"));
        assert_eq!(draft.memo, None);
        assert!(draft.is_fixed);
    }

    #[test]
    fn installments_dropped_for_non_card_or_income() {
        let draft = transaction_form().validate(&[cash(10)]).unwrap();
        assert_eq!(draft.installment_months, None);

        let mut form = transaction_form();
        form.kind = "income".into();
        let draft = form.validate(&[card(10)]).unwrap();
        assert_eq!(draft.installment_months, None);
        assert!(!draft.is_fixed);

        let mut form = transaction_form();
        form.installment_months = Some(5);
        assert_eq!(form.validate(&[card(10)]).unwrap().installment_months, None);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut form = transaction_form();
        form.amount = "0".into();
        assert!(matches!(form.validate(&[]), Err(AppError::Invalid(_))));
    }

    #[test]
    fn category_defaults_icon_and_color() {
        let form = CategoryForm {
            name: "  반려동물 ".into(),
            icon: "".into(),
            color: "#123456".into(),
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.name, "반려동물");
        assert_eq!(draft.icon, "✨");
        assert_eq!(draft.color, "#6B7280");
        assert_eq!(draft.budget_amount, 0);
        assert!(!draft.is_default);

        let blank = CategoryForm {
            name: "   ".into(),
            icon: "🐶".into(),
            color: "#EF4444".into(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn budget_changes_only_list_edited_rows() {
        let category = |id, budget| Category {
            id,
            user_id: 1,
            name: format!("c{id}"),
            icon: "✨".into(),
            color: "#6B7280".into(),
            budget_amount: budget,
            is_default: false,
            created_at: String::new(),
        };
        let categories = vec![category(1, 0), category(2, 300_000), category(3, 50_000)];
        let form = BudgetForm {
            budgets: HashMap::from([
                (1, "".to_string()),
                (2, "300,000".to_string()),
                (3, "".to_string()),
            ]),
        };
        assert_eq!(form.changes(&categories).unwrap(), vec![(3, 0)]);

        let bad = BudgetForm {
            budgets: HashMap::from([(1, "abc".to_string())]),
        };
        assert!(bad.changes(&categories).is_err());
    }

    #[test]
    fn billing_fields_only_for_cards() {
        let form = PaymentMethodForm {
            name: "신한카드".into(),
            kind: "card".into(),
            billing_day: Some("14".into()),
            billing_start_day: Some("1".into()),
            billing_end_day: Some("말일".into()),
        };
        let draft = form.validate().unwrap();
        assert_eq!(
            draft.billing,
            BillingCycle {
                billing_day: Some(14),
                start_day: Some(1),
                end_day: Some(0),
            }
        );

        let bank = PaymentMethodForm {
            kind: "bank".into(),
            ..form
        };
        assert_eq!(bank.validate().unwrap().billing, BillingCycle::default());
    }

    #[test]
    fn billing_day_range_is_enforced() {
        let form = PaymentMethodForm {
            name: "카드".into(),
            kind: "card".into(),
            billing_day: Some("29".into()),
            billing_start_day: None,
            billing_end_day: None,
        };
        assert!(form.validate().is_err());
    }
}
