use std::sync::Arc;

use crate::cache::{self, QueryCache};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::format::month_range;
use crate::models::{
    Category, FixedExpense, MonthlyStats, PaymentMethod, Transaction, TransactionKind,
};

/// Cached reads for one signed-in user.
pub struct Queries<'a> {
    pool: &'a DbPool,
    cache: &'a QueryCache,
    user_id: i64,
}

impl<'a> Queries<'a> {
    pub fn new(pool: &'a DbPool, cache: &'a QueryCache, user_id: i64) -> Self {
        Self {
            pool,
            cache,
            user_id,
        }
    }

    pub fn categories(&self) -> AppResult<Arc<Vec<Category>>> {
        self.cache.fetch(self.user_id, cache::CATEGORIES, || {
            let conn = self.pool.get()?;
            Ok(db::list_categories(&conn, self.user_id)?)
        })
    }

    pub fn payment_methods(&self) -> AppResult<Arc<Vec<PaymentMethod>>> {
        self.cache.fetch(self.user_id, cache::PAYMENT_METHODS, || {
            let conn = self.pool.get()?;
            Ok(db::list_payment_methods(&conn, self.user_id)?)
        })
    }

    /// Every transaction dated within the month, first to last day inclusive.
    pub fn transactions(&self, year: i32, month: u32) -> AppResult<Arc<Vec<Transaction>>> {
        let (start, end) = month_range(year, month)
            .ok_or_else(|| AppError::Invalid(format!("invalid month {year}-{month}")))?;
        self.cache
            .fetch(self.user_id, &cache::transactions_key(year, month), || {
                let conn = self.pool.get()?;
                Ok(db::list_transactions(&conn, self.user_id, start, end)?)
            })
    }

    pub fn fixed_expenses(&self) -> AppResult<Arc<Vec<FixedExpense>>> {
        self.cache.fetch(self.user_id, cache::FIXED_EXPENSES, || {
            let conn = self.pool.get()?;
            Ok(db::list_fixed_expenses(&conn, self.user_id)?)
        })
    }

    pub fn monthly_stats(&self, year: i32, month: u32) -> AppResult<MonthlyStats> {
        Ok(monthly_stats(&self.transactions(year, month)?))
    }
}

pub fn monthly_stats(transactions: &[Transaction]) -> MonthlyStats {
    let mut stats = MonthlyStats::default();
    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => stats.income += transaction.amount,
            TransactionKind::Expense => stats.expense += transaction.amount,
        }
    }
    stats.balance = stats.income - stats.expense;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{test_pool, test_user};
    use crate::models::NewTransaction;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn record(kind: TransactionKind, amount: i64, date: &str) -> NewTransaction {
        NewTransaction {
            kind,
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

    #[test]
    fn stats_reduce_the_month() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = test_user(&conn, "stats@example.com");
        db::insert_transaction(&conn, user, &record(TransactionKind::Income, 3_000_000, "2025-03-10")).unwrap();
        db::insert_transaction(&conn, user, &record(TransactionKind::Expense, 12_000, "2025-03-11")).unwrap();
        db::insert_transaction(&conn, user, &record(TransactionKind::Expense, 8_000, "2025-03-31")).unwrap();
        db::insert_transaction(&conn, user, &record(TransactionKind::Expense, 99_000, "2025-04-01")).unwrap();

        let cache = QueryCache::new(Duration::from_secs(60));
        let queries = Queries::new(&pool, &cache, user);
        let stats = queries.monthly_stats(2025, 3).unwrap();
        assert_eq!(
            stats,
            MonthlyStats {
                income: 3_000_000,
                expense: 20_000,
                balance: 2_980_000,
            }
        );
    }

    #[test]
    fn reads_are_served_from_cache_until_invalidated() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = test_user(&conn, "cached@example.com");
        let store = QueryCache::new(Duration::from_secs(60));
        let queries = Queries::new(&pool, &store, user);

        assert!(queries.transactions(2025, 6).unwrap().is_empty());
        db::insert_transaction(&conn, user, &record(TransactionKind::Expense, 5_000, "2025-06-02")).unwrap();
        assert!(queries.transactions(2025, 6).unwrap().is_empty());

        store.invalidate(user, &cache::transactions_key(2025, 6));
        assert_eq!(queries.transactions(2025, 6).unwrap().len(), 1);
    }

    #[test]
    fn invalid_month_is_rejected() {
        let (_dir, pool) = test_pool();
        let cache = QueryCache::new(Duration::from_secs(60));
        let queries = Queries::new(&pool, &cache, 1);
        assert!(matches!(queries.transactions(2025, 13), Err(AppError::Invalid(_))));
    }
}
