use rocket::State;
use rocket::form::Form;
use rocket::http::{CookieJar, RawStr};
use rocket::response::Redirect;
use rocket::Route;
use rocket_dyn_templates::Template;

use super::{month_query, or_empty, require_user, selected_month};
use crate::cache::QueryCache;
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::forms::{BudgetForm, CategoryForm};
use crate::models::Category;
use crate::mutations::{Mutations, save_failed_message};
use crate::queries::Queries;
use crate::views::{self, BudgetDraftView};

pub fn routes() -> Vec<Route> {
    routes![
        new_category,
        edit_category,
        create_category,
        update_category,
        delete_category,
        clear_budget,
        save_budgets,
        toggle_fixed_expense,
        delete_fixed_expense,
    ]
}

pub(super) fn render_budget_edit(
    year: i32,
    month: u32,
    drafts: Vec<BudgetDraftView>,
    error: Option<String>,
) -> Template {
    Template::render(
        "budget_edit",
        serde_json::json!({
            "tab": "budget",
            "year": year,
            "month": month,
            "drafts": drafts,
            "error": error,
        }),
    )
}

fn render_category_form(
    existing: Option<&Category>,
    form: Option<&CategoryForm>,
    error: Option<String>,
) -> Template {
    let mut view = views::category_form(existing, error);
    if let Some(form) = form {
        view.name = form.name.clone();
    }
    Template::render("category_form", serde_json::json!({ "view": view }))
}

fn budget_redirect() -> Redirect {
    Redirect::to("/budget")
}

fn load_category(pool: &DbPool, user_id: i64, id: i64) -> AppResult<Category> {
    let conn = pool.get()?;
    db::category(&conn, user_id, id)?.ok_or(AppError::NotFound("category"))
}

/// Writes without a form of their own report failures on the budget tab.
fn budget_with_error(err: &AppError) -> Redirect {
    tracing::error!(error = %err, "budget tab write failed");
    Redirect::to(format!(
        "/budget?error={}",
        RawStr::new(&save_failed_message(err)).percent_encode().as_str()
    ))
}

#[get("/categories/new")]
fn new_category(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Result<Template, Redirect> {
    require_user(pool, cookies)?;
    Ok(render_category_form(None, None, None))
}

#[get("/categories/<id>/edit")]
fn edit_category(
    pool: &State<DbPool>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let category = load_category(pool, user.id, id).map_err(|err| budget_with_error(&err))?;
    Ok(render_category_form(Some(&category), None, None))
}

#[post("/categories", data = "<form>")]
fn create_category(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    form: Form<CategoryForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let form = form.into_inner();
    let draft = form
        .validate()
        .map_err(|err| render_category_form(None, Some(&form), Some(err.to_string())))?;
    Mutations::new(pool, cache, user.id)
        .create_category(&draft)
        .map_err(|err| render_category_form(None, Some(&form), Some(save_failed_message(&err))))?;
    Ok(budget_redirect())
}

#[post("/categories/<id>", data = "<form>")]
fn update_category(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
    form: Form<CategoryForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let existing = load_category(pool, user.id, id).ok();
    let form = form.into_inner();
    let draft = form
        .validate()
        .map_err(|err| render_category_form(existing.as_ref(), Some(&form), Some(err.to_string())))?;
    Mutations::new(pool, cache, user.id)
        .update_category(id, &draft)
        .map_err(|err| {
            render_category_form(existing.as_ref(), Some(&form), Some(save_failed_message(&err)))
        })?;
    Ok(budget_redirect())
}

#[post("/categories/<id>/delete")]
fn delete_category(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Redirect {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match Mutations::new(pool, cache, user.id).delete_category(id) {
        Ok(()) => budget_redirect(),
        Err(err) => budget_with_error(&err),
    }
}

#[post("/categories/<id>/budget/clear")]
fn clear_budget(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Redirect {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match Mutations::new(pool, cache, user.id).clear_budget(id) {
        Ok(()) => budget_redirect(),
        Err(err) => budget_with_error(&err),
    }
}

#[post("/budget?<year>&<month>", data = "<form>")]
fn save_budgets(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    year: Option<i32>,
    month: Option<u32>,
    form: Form<BudgetForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let (year, month) = selected_month(year, month, None);
    let queries = Queries::new(pool, cache, user.id);
    let categories = or_empty(queries.categories(), "categories");
    let form = form.into_inner();

    // Re-render with what the user typed, not the stored values.
    let redraw = |error: String| {
        let mut drafts = views::budget_drafts(&categories, false);
        for draft in &mut drafts {
            if let Some(value) = form.budgets.get(&draft.id) {
                draft.value = value.clone();
            }
        }
        render_budget_edit(year, month, drafts, Some(error))
    };

    let changes = form.changes(&categories).map_err(|err| redraw(err.to_string()))?;
    Mutations::new(pool, cache, user.id)
        .save_budgets(&changes)
        .map_err(|err| redraw(save_failed_message(&err)))?;
    Ok(Redirect::to(format!("/budget?{}", month_query(year, month))))
}

#[post("/fixed-expenses/<id>/toggle")]
fn toggle_fixed_expense(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Redirect {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match Mutations::new(pool, cache, user.id).toggle_fixed_expense(id) {
        Ok(_) => budget_redirect(),
        Err(err) => budget_with_error(&err),
    }
}

#[post("/fixed-expenses/<id>/delete")]
fn delete_fixed_expense(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Redirect {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match Mutations::new(pool, cache, user.id).delete_fixed_expense(id) {
        Ok(()) => budget_redirect(),
        Err(err) => budget_with_error(&err),
    }
}
