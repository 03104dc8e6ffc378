use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

use crate::error::{AppError, AppResult};
use crate::models::{
    BillingCycle, Category, FixedExpense, NewCategory, NewFixedExpense, NewPaymentMethod,
    NewTransaction, PaymentMethod, PaymentMethodType, Transaction, TransactionKind, User,
};

pub type DbPool = Pool<SqliteConnectionManager>;

const CATEGORY_COLUMNS: &str =
    "c.id, c.user_id, c.name, c.icon, c.color, c.budget_amount, c.is_default, c.created_at";
const PAYMENT_METHOD_COLUMNS: &str = "p.id, p.user_id, p.name, p.type, p.color, p.icon, \
     p.is_default, p.billing_day, p.billing_start_day, p.billing_end_day, p.created_at";
const CATEGORY_WIDTH: usize = 8;
const PAYMENT_METHOD_WIDTH: usize = 11;

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("식비", "utensils", "#EF4444"),
    ("교통", "car", "#3B82F6"),
    ("쇼핑", "shopping-bag", "#EC4899"),
    ("주거", "home", "#F59E0B"),
    ("문화", "music", "#8B5CF6"),
    ("의료", "heart-pulse", "#14B8A6"),
    ("교육", "book-open", "#6366F1"),
    ("기타지출", "minus-circle", "#78716C"),
    ("급여", "banknote", "#22C55E"),
    ("기타수입", "plus-circle", "#10B981"),
];

pub fn init_db(path: &Path) -> AppResult<DbPool> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });
    let pool = Pool::new(manager)?;
    {
        let conn = pool.get()?;
        run_migrations(&conn)?;
    }
    tracing::info!(path = %path.display(), "database ready");
    Ok(pool)
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            token TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            budget_amount INTEGER NOT NULL DEFAULT 0 CHECK(budget_amount >= 0),
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS payment_methods (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK(type IN ('card', 'bank', 'cash', 'other')),
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            billing_day INTEGER CHECK(billing_day BETWEEN 1 AND 28),
            billing_start_day INTEGER CHECK(billing_start_day BETWEEN 1 AND 31),
            billing_end_day INTEGER CHECK(billing_end_day BETWEEN 0 AND 31),
            created_at TEXT NOT NULL,
            CHECK(type = 'card' OR (billing_day IS NULL
                AND billing_start_day IS NULL AND billing_end_day IS NULL)),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
            amount INTEGER NOT NULL CHECK(amount > 0),
            category_id INTEGER,
            payment_method_id INTEGER,
            description TEXT,
            memo TEXT,
            date TEXT NOT NULL,
            is_fixed INTEGER NOT NULL DEFAULT 0,
            installment_months INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS transactions_user_date
            ON transactions(user_id, date);

        CREATE TABLE IF NOT EXISTS fixed_expenses (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER,
            payment_method_id INTEGER,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL,
            due_day INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        );
        ",
    )
}

fn parse_text<T: FromStr<Err = AppError>>(row: &Row<'_>, index: usize) -> Result<T> {
    let raw: String = row.get(index)?;
    raw.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn category_at(row: &Row<'_>, offset: usize) -> Result<Option<Category>> {
    let Some(id) = row.get::<_, Option<i64>>(offset)? else {
        return Ok(None);
    };
    Ok(Some(Category {
        id,
        user_id: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        icon: row.get(offset + 3)?,
        color: row.get(offset + 4)?,
        budget_amount: row.get(offset + 5)?,
        is_default: row.get(offset + 6)?,
        created_at: row.get(offset + 7)?,
    }))
}

fn payment_method_at(row: &Row<'_>, offset: usize) -> Result<Option<PaymentMethod>> {
    let Some(id) = row.get::<_, Option<i64>>(offset)? else {
        return Ok(None);
    };
    Ok(Some(PaymentMethod {
        id,
        user_id: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        kind: parse_text(row, offset + 3)?,
        color: row.get(offset + 4)?,
        icon: row.get(offset + 5)?,
        is_default: row.get(offset + 6)?,
        billing: BillingCycle {
            billing_day: row.get(offset + 7)?,
            start_day: row.get(offset + 8)?,
            end_day: row.get(offset + 9)?,
        },
        created_at: row.get(offset + 10)?,
    }))
}

fn collect<T>(rows: impl Iterator<Item = Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// users & sessions

pub fn insert_user(conn: &Connection, email: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![email, password_hash, now_timestamp()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn user_credentials(conn: &Connection, email: &str) -> Result<Option<(i64, String)>> {
    conn.query_row(
        "SELECT id, password_hash FROM users WHERE email = ?1",
        params![email],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn create_session(conn: &Connection, user_id: i64, token: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (user_id, token, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, token, now_timestamp()],
    )?;
    Ok(())
}

pub fn user_by_session(conn: &Connection, token: &str) -> Result<Option<User>> {
    conn.query_row(
        "
        SELECT u.id, u.email
        FROM sessions s
        JOIN users u ON s.user_id = u.id
        WHERE s.token = ?1
        ",
        params![token],
        |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
            })
        },
    )
    .optional()
}

pub fn delete_session(conn: &Connection, token: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

pub fn session_count(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}

pub fn prune_sessions(conn: &Connection, user_id: i64, keep: i64) -> Result<()> {
    conn.execute(
        "
        DELETE FROM sessions
        WHERE user_id = ?1
          AND id NOT IN (
            SELECT id
            FROM sessions
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
          )
        ",
        params![user_id, keep],
    )?;
    Ok(())
}

/// Gives a fresh account the default categories and a cash wallet.
pub fn seed_defaults(conn: &Connection, user_id: i64) -> Result<()> {
    for (name, icon, color) in DEFAULT_CATEGORIES {
        insert_category(
            conn,
            user_id,
            &NewCategory {
                name: (*name).to_string(),
                icon: (*icon).to_string(),
                color: (*color).to_string(),
                budget_amount: 0,
                is_default: true,
            },
        )?;
    }
    insert_payment_method(
        conn,
        user_id,
        &NewPaymentMethod {
            name: "현금".to_string(),
            kind: PaymentMethodType::Cash,
            is_default: true,
            billing: BillingCycle::default(),
        },
    )?;
    Ok(())
}

// categories

pub fn list_categories(conn: &Connection, user_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT {CATEGORY_COLUMNS}
        FROM categories c
        WHERE c.user_id = ?1
        ORDER BY c.created_at ASC, c.id ASC
        "
    ))?;
    let rows = stmt.query_map(params![user_id], |row| {
        category_at(row, 0)?.ok_or(rusqlite::Error::InvalidColumnType(0, "id".into(), Type::Null))
    })?;
    collect(rows)
}

pub fn category(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.user_id = ?1 AND c.id = ?2"),
        params![user_id, id],
        |row| category_at(row, 0),
    )
    .optional()
    .map(Option::flatten)
}

pub fn insert_category(conn: &Connection, user_id: i64, category: &NewCategory) -> Result<i64> {
    conn.execute(
        "
        INSERT INTO categories (user_id, name, icon, color, budget_amount, is_default, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
        params![
            user_id,
            category.name,
            category.icon,
            category.color,
            category.budget_amount,
            category.is_default,
            now_timestamp()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_category(
    conn: &Connection,
    user_id: i64,
    id: i64,
    name: &str,
    icon: &str,
    color: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE categories SET name = ?1, icon = ?2, color = ?3 WHERE id = ?4 AND user_id = ?5",
        params![name, icon, color, id, user_id],
    )
}

pub fn update_category_budget(
    conn: &Connection,
    user_id: i64,
    id: i64,
    budget_amount: i64,
) -> Result<usize> {
    conn.execute(
        "UPDATE categories SET budget_amount = ?1 WHERE id = ?2 AND user_id = ?3",
        params![budget_amount, id, user_id],
    )
}

/// Removes the category only; rows referencing it keep the stale id.
pub fn delete_category(conn: &Connection, user_id: i64, id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )
}

// payment methods

pub fn list_payment_methods(conn: &Connection, user_id: i64) -> Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT {PAYMENT_METHOD_COLUMNS}
        FROM payment_methods p
        WHERE p.user_id = ?1
        ORDER BY p.created_at ASC, p.id ASC
        "
    ))?;
    let rows = stmt.query_map(params![user_id], |row| {
        payment_method_at(row, 0)?
            .ok_or(rusqlite::Error::InvalidColumnType(0, "id".into(), Type::Null))
    })?;
    collect(rows)
}

pub fn payment_method(conn: &Connection, user_id: i64, id: i64) -> Result<Option<PaymentMethod>> {
    conn.query_row(
        &format!(
            "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods p WHERE p.user_id = ?1 AND p.id = ?2"
        ),
        params![user_id, id],
        |row| payment_method_at(row, 0),
    )
    .optional()
    .map(Option::flatten)
}

pub fn insert_payment_method(
    conn: &Connection,
    user_id: i64,
    method: &NewPaymentMethod,
) -> Result<i64> {
    conn.execute(
        "
        INSERT INTO payment_methods (
            user_id, name, type, color, icon, is_default,
            billing_day, billing_start_day, billing_end_day, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
        params![
            user_id,
            method.name,
            method.kind.as_str(),
            method.kind.color(),
            method.kind.icon(),
            method.is_default,
            method.billing.billing_day,
            method.billing.start_day,
            method.billing.end_day,
            now_timestamp()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_payment_method(
    conn: &Connection,
    user_id: i64,
    id: i64,
    method: &NewPaymentMethod,
) -> Result<usize> {
    conn.execute(
        "
        UPDATE payment_methods
        SET name = ?1, type = ?2, color = ?3, icon = ?4,
            billing_day = ?5, billing_start_day = ?6, billing_end_day = ?7
        WHERE id = ?8 AND user_id = ?9
        ",
        params![
            method.name,
            method.kind.as_str(),
            method.kind.color(),
            method.kind.icon(),
            method.billing.billing_day,
            method.billing.start_day,
            method.billing.end_day,
            id,
            user_id
        ],
    )
}

pub fn delete_payment_method(conn: &Connection, user_id: i64, id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM payment_methods WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )
}

// transactions

pub fn list_transactions(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT t.id, t.user_id, t.type, t.amount, t.category_id, t.payment_method_id,
               t.description, t.memo, t.date, t.is_fixed, t.installment_months,
               t.created_at, t.updated_at,
               {CATEGORY_COLUMNS},
               {PAYMENT_METHOD_COLUMNS}
        FROM transactions t
        LEFT JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
        LEFT JOIN payment_methods p ON p.id = t.payment_method_id AND p.user_id = t.user_id
        WHERE t.user_id = ?1 AND t.date >= ?2 AND t.date <= ?3
        ORDER BY t.date ASC, t.created_at DESC, t.id DESC
        "
    ))?;
    let rows = stmt.query_map(params![user_id, start, end], |row| {
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: parse_text::<TransactionKind>(row, 2)?,
            amount: row.get(3)?,
            category_id: row.get(4)?,
            payment_method_id: row.get(5)?,
            description: row.get(6)?,
            memo: row.get(7)?,
            date: row.get(8)?,
            is_fixed: row.get(9)?,
            installment_months: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            category: category_at(row, 13)?,
            payment_method: payment_method_at(row, 13 + CATEGORY_WIDTH)?,
        })
    })?;
    collect(rows)
}

pub fn insert_transaction(
    conn: &Connection,
    user_id: i64,
    transaction: &NewTransaction,
) -> Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "
        INSERT INTO transactions (
            user_id, type, amount, category_id, payment_method_id, description, memo,
            date, is_fixed, installment_months, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        ",
        params![
            user_id,
            transaction.kind.as_str(),
            transaction.amount,
            transaction.category_id,
            transaction.payment_method_id,
            transaction.description,
            transaction.memo,
            transaction.date,
            transaction.is_fixed,
            transaction.installment_months,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes the transaction and returns the date it was booked on.
pub fn delete_transaction(conn: &Connection, user_id: i64, id: i64) -> Result<Option<NaiveDate>> {
    let date: Option<NaiveDate> = conn
        .query_row(
            "SELECT date FROM transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    if date.is_some() {
        conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
    }
    Ok(date)
}

// fixed expenses

pub fn list_fixed_expenses(conn: &Connection, user_id: i64) -> Result<Vec<FixedExpense>> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT f.id, f.user_id, f.category_id, f.payment_method_id, f.description,
               f.amount, f.due_day, f.is_active, f.created_at,
               {CATEGORY_COLUMNS},
               {PAYMENT_METHOD_COLUMNS}
        FROM fixed_expenses f
        LEFT JOIN categories c ON c.id = f.category_id AND c.user_id = f.user_id
        LEFT JOIN payment_methods p ON p.id = f.payment_method_id AND p.user_id = f.user_id
        WHERE f.user_id = ?1
        ORDER BY f.due_day ASC, f.id ASC
        "
    ))?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(FixedExpense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category_id: row.get(2)?,
            payment_method_id: row.get(3)?,
            description: row.get(4)?,
            amount: row.get(5)?,
            due_day: row.get(6)?,
            is_active: row.get(7)?,
            created_at: row.get(8)?,
            category: category_at(row, 9)?,
            payment_method: payment_method_at(row, 9 + CATEGORY_WIDTH)?,
        })
    })?;
    collect(rows)
}

pub fn insert_fixed_expense(
    conn: &Connection,
    user_id: i64,
    expense: &NewFixedExpense,
) -> Result<i64> {
    conn.execute(
        "
        INSERT INTO fixed_expenses (
            user_id, category_id, payment_method_id, description, amount, due_day,
            is_active, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ",
        params![
            user_id,
            expense.category_id,
            expense.payment_method_id,
            expense.description,
            expense.amount,
            expense.due_day,
            expense.is_active,
            now_timestamp()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_fixed_expense_active(
    conn: &Connection,
    user_id: i64,
    id: i64,
    is_active: bool,
) -> Result<usize> {
    conn.execute(
        "UPDATE fixed_expenses SET is_active = ?1 WHERE id = ?2 AND user_id = ?3",
        params![is_active, id, user_id],
    )
}

pub fn fixed_expense_active(conn: &Connection, user_id: i64, id: i64) -> Result<Option<bool>> {
    conn.query_row(
        "SELECT is_active FROM fixed_expenses WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
        |row| row.get(0),
    )
    .optional()
}

pub fn delete_fixed_expense(conn: &Connection, user_id: i64, id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM fixed_expenses WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn test_pool() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = init_db(&dir.path().join("test.sqlite")).expect("db pool");
        (dir, pool)
    }

    pub(crate) fn test_user(conn: &Connection, email: &str) -> i64 {
        let id = insert_user(conn, email, "hash").expect("insert user");
        seed_defaults(conn, id).expect("seed defaults");
        id
    }

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn expense(amount: i64, date: &str, category_id: Option<i64>) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Expense,
            amount,
            category_id,
            payment_method_id: None,
            description: None,
            memo: None,
            date: day(date),
            is_fixed: false,
            installment_months: None,
        }
    }

    #[test]
    fn seeding_creates_default_rows() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = test_user(&conn, "seed@example.com");
        let categories = list_categories(&conn, user).unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories.iter().all(|c| c.is_default && c.budget_amount == 0));
        let methods = list_payment_methods(&conn, user).unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].kind, PaymentMethodType::Cash);
        assert_eq!(methods[0].billing, BillingCycle::default());
    }

    #[test]
    fn month_listing_filters_by_range_and_owner() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = test_user(&conn, "alice@example.com");
        let bob = test_user(&conn, "bob@example.com");

        insert_transaction(&conn, alice, &expense(1000, "2025-03-01", None)).unwrap();
        insert_transaction(&conn, alice, &expense(2000, "2025-03-31", None)).unwrap();
        insert_transaction(&conn, alice, &expense(3000, "2025-04-01", None)).unwrap();
        insert_transaction(&conn, bob, &expense(4000, "2025-03-15", None)).unwrap();

        let march = list_transactions(&conn, alice, day("2025-03-01"), day("2025-03-31")).unwrap();
        let amounts: Vec<i64> = march.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1000, 2000]);
    }

    #[test]
    fn deleting_category_leaves_dangling_reference() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = test_user(&conn, "dangling@example.com");
        let food = list_categories(&conn, user).unwrap()[0].id;
        insert_transaction(&conn, user, &expense(12000, "2025-05-02", Some(food))).unwrap();

        assert_eq!(delete_category(&conn, user, food).unwrap(), 1);

        let rows = list_transactions(&conn, user, day("2025-05-01"), day("2025-05-31")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_id, Some(food));
        assert!(rows[0].category.is_none());
        assert_eq!(rows[0].title(), "미분류");
    }

    #[test]
    fn mutations_are_scoped_to_owner() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = test_user(&conn, "owner@example.com");
        let mallory = test_user(&conn, "other@example.com");
        let food = list_categories(&conn, alice).unwrap()[0].id;

        assert_eq!(update_category_budget(&conn, mallory, food, 5000).unwrap(), 0);
        assert_eq!(delete_category(&conn, mallory, food).unwrap(), 0);
        assert!(category(&conn, alice, food).unwrap().is_some());
        assert!(category(&conn, mallory, food).unwrap().is_none());
    }

    #[test]
    fn non_card_rows_reject_billing_fields() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = test_user(&conn, "billing@example.com");
        let result = insert_payment_method(
            &conn,
            user,
            &NewPaymentMethod {
                name: "통장".into(),
                kind: PaymentMethodType::Bank,
                is_default: false,
                billing: BillingCycle {
                    billing_day: Some(15),
                    start_day: None,
                    end_day: None,
                },
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn sessions_are_pruned_to_newest() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let user = insert_user(&conn, "sessions@example.com", "hash").unwrap();
        for token in ["a", "b", "c"] {
            create_session(&conn, user, token).unwrap();
        }
        prune_sessions(&conn, user, 2).unwrap();
        assert_eq!(session_count(&conn, user).unwrap(), 2);
        assert!(user_by_session(&conn, "a").unwrap().is_none());
        assert_eq!(user_by_session(&conn, "c").unwrap().unwrap().id, user);
    }
}
