use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use rocket::State;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::Route;

use crate::auth::{self, SESSION_COOKIE};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::User;

mod account;
mod budget;
mod tabs;
mod transactions;
mod wallet;

pub const LOGIN_PATH: &str = "/auth/login";

pub fn routes() -> Vec<Route> {
    let mut all = account::routes();
    all.extend(tabs::routes());
    all.extend(transactions::routes());
    all.extend(budget::routes());
    all.extend(wallet::routes());
    all
}

/// Resolves the signed-in user or sends the browser to the login page.
pub(crate) fn require_user(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Result<User, Redirect> {
    current_user(pool, cookies).ok_or_else(|| Redirect::to(LOGIN_PATH))
}

pub(crate) fn current_user(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Option<User> {
    let token = cookies.get(SESSION_COOKIE)?.value().to_string();
    auth::current_user(pool, &token)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}

/// Month shown by a tab: explicit `year`/`month`, else the month of `date`,
/// else the current month.
pub(crate) fn selected_month(
    year: Option<i32>,
    month: Option<u32>,
    date: Option<NaiveDate>,
) -> (i32, u32) {
    let fallback = date.unwrap_or_else(today);
    match (year, month) {
        (Some(year), Some(month)) if (1..=12).contains(&month) => (year, month),
        _ => (fallback.year(), fallback.month()),
    }
}

/// Reads degrade to an empty list; the page still renders.
pub(crate) fn or_empty<T>(result: AppResult<Arc<Vec<T>>>, what: &str) -> Arc<Vec<T>> {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load {what}");
        Arc::new(Vec::new())
    })
}

pub(crate) fn month_query(year: i32, month: u32) -> String {
    format!("year={year}&month={month}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_selection_prefers_explicit_values() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 14);
        assert_eq!(selected_month(Some(2024), Some(2), date), (2024, 2));
        assert_eq!(selected_month(None, None, date), (2025, 7));
        assert_eq!(selected_month(Some(2024), Some(13), date), (2025, 7));
    }

    #[test]
    fn dates_parse_from_query_values() {
        assert_eq!(parse_date(Some("2025-03-05")), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date(Some("05/03/2025")), None);
        assert_eq!(parse_date(None), None);
    }
}
