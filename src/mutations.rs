use chrono::{Datelike, NaiveDate};

use crate::cache::{self, QueryCache};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{
    DEFAULT_FIXED_DESCRIPTION, NewCategory, NewFixedExpense, NewPaymentMethod, NewTransaction,
    TransactionKind,
};

/// Message shown on a form whose write was refused by the store.
pub fn save_failed_message(err: &AppError) -> String {
    format!("저장에 실패했습니다: {err}")
}

/// Writes for one signed-in user. Every write invalidates the cache keys
/// whose rows it could change.
pub struct Mutations<'a> {
    pool: &'a DbPool,
    cache: &'a QueryCache,
    user_id: i64,
}

impl<'a> Mutations<'a> {
    pub fn new(pool: &'a DbPool, cache: &'a QueryCache, user_id: i64) -> Self {
        Self {
            pool,
            cache,
            user_id,
        }
    }

    /// Categories and payment methods are read joined into transactions and
    /// fixed expenses, so renaming or deleting one touches those keys too.
    fn invalidate_joined(&self, key: &str) {
        self.cache.invalidate(self.user_id, key);
        self.cache.invalidate_transactions(self.user_id);
        self.cache.invalidate(self.user_id, cache::FIXED_EXPENSES);
    }

    /// Inserts the transaction and, when recurring, registers a fixed expense
    /// due on the same day of the month. The second write is independent: if
    /// it fails the transaction stays.
    pub fn create_transaction(&self, draft: &NewTransaction) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let id = db::insert_transaction(&conn, self.user_id, draft)?;
        tracing::info!(user_id = self.user_id, id, date = %draft.date, "transaction created");

        if draft.is_fixed && draft.kind == TransactionKind::Expense {
            let fixed = NewFixedExpense {
                category_id: draft.category_id,
                payment_method_id: draft.payment_method_id,
                description: draft
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .unwrap_or(DEFAULT_FIXED_DESCRIPTION)
                    .to_string(),
                amount: draft.amount,
                due_day: draft.date.day(),
                is_active: true,
            };
            match db::insert_fixed_expense(&conn, self.user_id, &fixed) {
                Ok(fixed_id) => {
                    tracing::info!(user_id = self.user_id, id = fixed_id, "fixed expense registered")
                }
                Err(err) => tracing::warn!(
                    user_id = self.user_id,
                    transaction_id = id,
                    error = %err,
                    "fixed expense insert failed"
                ),
            }
            self.cache.invalidate(self.user_id, cache::FIXED_EXPENSES);
        }

        self.cache.invalidate(
            self.user_id,
            &cache::transactions_key(draft.date.year(), draft.date.month()),
        );
        Ok(id)
    }

    /// Returns the date the removed transaction was booked on.
    pub fn delete_transaction(&self, id: i64) -> AppResult<NaiveDate> {
        let conn = self.pool.get()?;
        let date = db::delete_transaction(&conn, self.user_id, id)?
            .ok_or(AppError::NotFound("transaction"))?;
        tracing::info!(user_id = self.user_id, id, "transaction deleted");
        self.cache
            .invalidate(self.user_id, &cache::transactions_key(date.year(), date.month()));
        Ok(date)
    }

    pub fn create_category(&self, draft: &NewCategory) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let id = db::insert_category(&conn, self.user_id, draft)?;
        tracing::info!(user_id = self.user_id, id, name = %draft.name, "category created");
        self.cache.invalidate(self.user_id, cache::CATEGORIES);
        Ok(id)
    }

    /// Only name, icon and colour are editable; the budget has its own form.
    pub fn update_category(&self, id: i64, draft: &NewCategory) -> AppResult<()> {
        let conn = self.pool.get()?;
        let changed =
            db::update_category(&conn, self.user_id, id, &draft.name, &draft.icon, &draft.color)?;
        if changed == 0 {
            return Err(AppError::NotFound("category"));
        }
        tracing::info!(user_id = self.user_id, id, "category updated");
        self.invalidate_joined(cache::CATEGORIES);
        Ok(())
    }

    /// Referencing transactions and fixed expenses keep the removed id.
    pub fn delete_category(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        if db::delete_category(&conn, self.user_id, id)? == 0 {
            return Err(AppError::NotFound("category"));
        }
        tracing::info!(user_id = self.user_id, id, "category deleted");
        self.invalidate_joined(cache::CATEGORIES);
        Ok(())
    }

    /// One update per changed category, issued in order. Stops at the first
    /// failure; earlier updates are kept.
    pub fn save_budgets(&self, changes: &[(i64, i64)]) -> AppResult<()> {
        let conn = self.pool.get()?;
        for &(id, budget) in changes {
            db::update_category_budget(&conn, self.user_id, id, budget)?;
        }
        tracing::info!(user_id = self.user_id, updated = changes.len(), "budgets saved");
        self.cache.invalidate(self.user_id, cache::CATEGORIES);
        Ok(())
    }

    pub fn clear_budget(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        if db::update_category_budget(&conn, self.user_id, id, 0)? == 0 {
            return Err(AppError::NotFound("category"));
        }
        tracing::info!(user_id = self.user_id, id, "budget cleared");
        self.cache.invalidate(self.user_id, cache::CATEGORIES);
        Ok(())
    }

    pub fn create_payment_method(&self, draft: &NewPaymentMethod) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let id = db::insert_payment_method(&conn, self.user_id, draft)?;
        tracing::info!(user_id = self.user_id, id, kind = %draft.kind.as_str(), "payment method created");
        self.cache.invalidate(self.user_id, cache::PAYMENT_METHODS);
        Ok(id)
    }

    pub fn update_payment_method(&self, id: i64, draft: &NewPaymentMethod) -> AppResult<()> {
        let conn = self.pool.get()?;
        if db::update_payment_method(&conn, self.user_id, id, draft)? == 0 {
            return Err(AppError::NotFound("payment method"));
        }
        tracing::info!(user_id = self.user_id, id, "payment method updated");
        self.invalidate_joined(cache::PAYMENT_METHODS);
        Ok(())
    }

    pub fn delete_payment_method(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        if db::delete_payment_method(&conn, self.user_id, id)? == 0 {
            return Err(AppError::NotFound("payment method"));
        }
        tracing::info!(user_id = self.user_id, id, "payment method deleted");
        self.invalidate_joined(cache::PAYMENT_METHODS);
        Ok(())
    }

    /// Flips `is_active` and returns the new state.
    pub fn toggle_fixed_expense(&self, id: i64) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let active = db::fixed_expense_active(&conn, self.user_id, id)?
            .ok_or(AppError::NotFound("fixed expense"))?;
        db::set_fixed_expense_active(&conn, self.user_id, id, !active)?;
        tracing::info!(user_id = self.user_id, id, active = !active, "fixed expense toggled");
        self.cache.invalidate(self.user_id, cache::FIXED_EXPENSES);
        Ok(!active)
    }

    pub fn delete_fixed_expense(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        if db::delete_fixed_expense(&conn, self.user_id, id)? == 0 {
            return Err(AppError::NotFound("fixed expense"));
        }
        tracing::info!(user_id = self.user_id, id, "fixed expense deleted");
        self.cache.invalidate(self.user_id, cache::FIXED_EXPENSES);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::category_stats;
    use crate::db::tests::{test_pool, test_user};
    use crate::models::{BillingCycle, PaymentMethodType};
    use crate::queries::Queries;
    use std::time::Duration;

    fn expense(amount: i64, date: &str) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Expense,
            amount,
            category_id: None,
            payment_method_id: None,
            description: None,
            memo: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            is_fixed: false,
            installment_months: None,
        }
    }

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(300))
    }

    #[test]
    fn recurring_expense_registers_fixed_expense() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "recurring@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        assert!(queries.fixed_expenses().unwrap().is_empty());
        assert!(queries.transactions(2025, 3).unwrap().is_empty());

        let draft = NewTransaction {
            is_fixed: true,
            ..expense(50_000, "2025-03-25")
        };
        mutations.create_transaction(&draft).unwrap();

        let transactions = queries.transactions(2025, 3).unwrap();
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].is_fixed);

        let fixed = queries.fixed_expenses().unwrap();
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].due_day, Some(25));
        assert_eq!(fixed[0].amount, 50_000);
        assert_eq!(fixed[0].description, "반복 지출");
        assert!(fixed[0].is_active);
    }

    #[test]
    fn insert_invalidates_only_the_transaction_month() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "months@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        queries.transactions(2025, 3).unwrap();
        queries.transactions(2025, 4).unwrap();
        queries.fixed_expenses().unwrap();
        mutations.create_transaction(&expense(9_000, "2025-04-02")).unwrap();

        assert!(cache.contains(user, &cache::transactions_key(2025, 3)));
        assert!(!cache.contains(user, &cache::transactions_key(2025, 4)));
        assert!(cache.contains(user, cache::FIXED_EXPENSES));
        assert_eq!(queries.transactions(2025, 4).unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_row_and_refreshes_its_month() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "delete@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        let kept = mutations.create_transaction(&expense(4_000, "2025-06-03")).unwrap();
        let gone = mutations.create_transaction(&expense(7_000, "2025-06-20")).unwrap();
        assert_eq!(queries.transactions(2025, 6).unwrap().len(), 2);
        queries.transactions(2025, 7).unwrap();
        queries.categories().unwrap();

        let date = mutations.delete_transaction(gone).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        assert!(!cache.contains(user, &cache::transactions_key(2025, 6)));
        assert!(cache.contains(user, &cache::transactions_key(2025, 7)));
        assert!(cache.contains(user, cache::CATEGORIES));

        let remaining = queries.transactions(2025, 6).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept);
        assert!(matches!(
            mutations.delete_transaction(gone),
            Err(AppError::NotFound("transaction"))
        ));
    }

    #[test]
    fn deleting_a_category_keeps_transactions_as_uncategorized() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "orphans@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        let food = queries.categories().unwrap()[0].id;
        mutations
            .create_transaction(&NewTransaction {
                category_id: Some(food),
                ..expense(15_000, "2025-05-09")
            })
            .unwrap();
        assert_eq!(queries.transactions(2025, 5).unwrap()[0].category.as_ref().unwrap().name, "식비");

        mutations.delete_category(food).unwrap();

        let transactions = queries.transactions(2025, 5).unwrap();
        assert_eq!(transactions[0].category_id, Some(food));
        assert!(transactions[0].category.is_none());
        let stats = category_stats(&transactions, &queries.categories().unwrap());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "미분류");
        assert_eq!(stats[0].amount, 15_000);
    }

    #[test]
    fn budgets_and_toggles_round_trip_through_cache() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "budget@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        let ids: Vec<i64> = queries.categories().unwrap().iter().map(|c| c.id).collect();
        mutations.save_budgets(&[(ids[0], 300_000), (ids[1], 80_000)]).unwrap();
        let categories = queries.categories().unwrap();
        assert_eq!(categories[0].budget_amount, 300_000);
        assert_eq!(categories[1].budget_amount, 80_000);

        mutations.clear_budget(ids[1]).unwrap();
        assert_eq!(queries.categories().unwrap()[1].budget_amount, 0);

        mutations
            .create_transaction(&NewTransaction {
                is_fixed: true,
                description: Some("월세".into()),
                ..expense(500_000, "2025-03-01")
            })
            .unwrap();
        let fixed_id = queries.fixed_expenses().unwrap()[0].id;
        assert!(!mutations.toggle_fixed_expense(fixed_id).unwrap());
        assert!(!queries.fixed_expenses().unwrap()[0].is_active);
        mutations.delete_fixed_expense(fixed_id).unwrap();
        assert!(queries.fixed_expenses().unwrap().is_empty());
    }

    #[test]
    fn payment_method_update_refreshes_joined_rows() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "wallet@example.com");
        let cache = cache();
        let queries = Queries::new(&pool, &cache, user);
        let mutations = Mutations::new(&pool, &cache, user);

        let draft = NewPaymentMethod {
            name: "신한카드".into(),
            kind: PaymentMethodType::Card,
            is_default: false,
            billing: BillingCycle {
                billing_day: Some(14),
                start_day: Some(1),
                end_day: Some(0),
            },
        };
        let card = mutations.create_payment_method(&draft).unwrap();
        mutations
            .create_transaction(&NewTransaction {
                payment_method_id: Some(card),
                ..expense(30_000, "2025-03-03")
            })
            .unwrap();
        queries.transactions(2025, 3).unwrap();

        mutations
            .update_payment_method(
                card,
                &NewPaymentMethod {
                    name: "현대카드".into(),
                    ..draft
                },
            )
            .unwrap();
        let transactions = queries.transactions(2025, 3).unwrap();
        assert_eq!(transactions[0].payment_method.as_ref().unwrap().name, "현대카드");
        assert_eq!(queries.payment_methods().unwrap().len(), 2);
    }

    #[test]
    fn missing_rows_report_not_found() {
        let (_dir, pool) = test_pool();
        let user = test_user(&pool.get().unwrap(), "missing@example.com");
        let cache = cache();
        let mutations = Mutations::new(&pool, &cache, user);
        assert!(matches!(mutations.delete_transaction(999), Err(AppError::NotFound(_))));
        assert!(matches!(mutations.toggle_fixed_expense(999), Err(AppError::NotFound(_))));
    }
}
