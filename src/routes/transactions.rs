use chrono::{Datelike, NaiveDate};
use rocket::State;
use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::Route;
use rocket_dyn_templates::Template;

use super::{month_query, or_empty, parse_date, require_user, today};
use crate::cache::QueryCache;
use crate::db::DbPool;
use crate::error::AppError;
use crate::format::format_date;
use crate::forms::TransactionForm;
use crate::models::TransactionKind;
use crate::mutations::{Mutations, save_failed_message};
use crate::queries::Queries;
use crate::views;

pub fn routes() -> Vec<Route> {
    routes![new_transaction, create_transaction, delete_transaction]
}

fn calendar_redirect(date: NaiveDate) -> Redirect {
    Redirect::to(format!(
        "/calendar?{}&date={}",
        month_query(date.year(), date.month()),
        format_date(date)
    ))
}

fn render_form(
    queries: &Queries<'_>,
    kind: TransactionKind,
    date: NaiveDate,
    payment_method_id: Option<i64>,
    submitted: Option<&TransactionForm>,
    error: Option<String>,
) -> Template {
    let categories = or_empty(queries.categories(), "categories");
    let methods = or_empty(queries.payment_methods(), "payment methods");
    let mut view = views::transaction_form(kind, date, payment_method_id, &categories, &methods, error);
    if let Some(form) = submitted {
        view.keep_input(form);
    }
    Template::render("transaction_form", serde_json::json!({ "view": view }))
}

#[get("/transactions/new?<date>&<kind>&<payment_method_id>")]
fn new_transaction(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    date: Option<String>,
    kind: Option<String>,
    payment_method_id: Option<i64>,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let queries = Queries::new(pool, cache, user.id);
    let kind = kind
        .and_then(|value| value.parse().ok())
        .unwrap_or(TransactionKind::Expense);
    let date = parse_date(date.as_deref()).unwrap_or_else(today);
    Ok(render_form(&queries, kind, date, payment_method_id, None, None))
}

#[post("/transactions", data = "<form>")]
fn create_transaction(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    form: Form<TransactionForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let queries = Queries::new(pool, cache, user.id);
    let form = form.into_inner();
    let kind = form.kind.parse().unwrap_or(TransactionKind::Expense);
    let date = parse_date(Some(&form.date)).unwrap_or_else(today);

    let methods = or_empty(queries.payment_methods(), "payment methods");
    let draft = form.validate(&methods).map_err(|err| {
        render_form(
            &queries,
            kind,
            date,
            form.payment_method_id,
            Some(&form),
            Some(err.to_string()),
        )
    })?;

    Mutations::new(pool, cache, user.id)
        .create_transaction(&draft)
        .map_err(|err| {
            tracing::error!(error = %err, "transaction insert failed");
            render_form(
                &queries,
                kind,
                date,
                form.payment_method_id,
                Some(&form),
                Some(save_failed_message(&err)),
            )
        })?;
    Ok(calendar_redirect(draft.date))
}

#[post("/transactions/<id>/delete")]
fn delete_transaction(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Result<Redirect, AppError> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let date = Mutations::new(pool, cache, user.id).delete_transaction(id)?;
    Ok(calendar_redirect(date))
}
