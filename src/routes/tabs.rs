use rocket::State;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::Route;
use rocket_dyn_templates::Template;

use super::{or_empty, parse_date, require_user, selected_month, today};
use crate::cache::QueryCache;
use crate::db::DbPool;
use crate::queries::Queries;
use crate::views;

pub fn routes() -> Vec<Route> {
    routes![index, calendar, budget, budget_edit, wallet, stats]
}

#[get("/")]
fn index() -> Redirect {
    Redirect::to("/calendar")
}

#[get("/calendar?<year>&<month>&<date>")]
fn calendar(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
    date: Option<String>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let selected = parse_date(date.as_deref());
    let (year, month) = selected_month(year, month, selected);
    let queries = Queries::new(pool, cache, user.id);
    let transactions = or_empty(queries.transactions(year, month), "transactions");
    let view = views::calendar_view(year, month, today(), selected, &transactions);

    let context = serde_json::json!({
        "tab": "calendar",
        "user_email": user.email,
        "view": view,
    });
    Ok(Template::render("calendar", &context))
}

#[get("/budget?<year>&<month>&<error>")]
fn budget(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
    error: Option<String>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let (year, month) = selected_month(year, month, None);
    let queries = Queries::new(pool, cache, user.id);
    let categories = or_empty(queries.categories(), "categories");
    let transactions = or_empty(queries.transactions(year, month), "transactions");
    let fixed_expenses = or_empty(queries.fixed_expenses(), "fixed expenses");
    let view = views::budget_page(year, month, &categories, &transactions, &fixed_expenses);

    let context = serde_json::json!({
        "tab": "budget",
        "user_email": user.email,
        "view": view,
        "error": error,
    });
    Ok(Template::render("budget", &context))
}

#[get("/budget/edit?<year>&<month>&<reset>")]
fn budget_edit(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
    reset: Option<bool>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let (year, month) = selected_month(year, month, None);
    let queries = Queries::new(pool, cache, user.id);
    let categories = or_empty(queries.categories(), "categories");
    Ok(super::budget::render_budget_edit(
        year,
        month,
        views::budget_drafts(&categories, reset.unwrap_or(false)),
        None,
    ))
}

#[get("/wallet?<year>&<month>")]
fn wallet(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let (year, month) = selected_month(year, month, None);
    let queries = Queries::new(pool, cache, user.id);
    let methods = or_empty(queries.payment_methods(), "payment methods");
    let transactions = or_empty(queries.transactions(year, month), "transactions");
    let view = views::wallet_page(year, month, &methods, &transactions);

    let context = serde_json::json!({
        "tab": "wallet",
        "user_email": user.email,
        "view": view,
    });
    Ok(Template::render("wallet", &context))
}

#[get("/stats?<year>&<month>")]
fn stats(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let (year, month) = selected_month(year, month, None);
    let queries = Queries::new(pool, cache, user.id);
    let categories = or_empty(queries.categories(), "categories");
    let methods = or_empty(queries.payment_methods(), "payment methods");
    let transactions = or_empty(queries.transactions(year, month), "transactions");
    let view = views::stats_page(year, month, &categories, &methods, &transactions);

    let context = serde_json::json!({
        "tab": "stats",
        "user_email": user.email,
        "view": view,
    });
    Ok(Template::render("stats", &context))
}
