use rocket::State;
use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::Route;
use rocket_dyn_templates::Template;

use super::require_user;
use crate::cache::QueryCache;
use crate::db::{self, DbPool};
use crate::error::AppError;
use crate::forms::PaymentMethodForm;
use crate::models::PaymentMethod;
use crate::mutations::{Mutations, save_failed_message};
use crate::views;

pub fn routes() -> Vec<Route> {
    routes![
        new_payment_method,
        edit_payment_method,
        create_payment_method,
        update_payment_method,
        delete_payment_method,
    ]
}

fn render_form(
    existing: Option<&PaymentMethod>,
    form: Option<&PaymentMethodForm>,
    error: Option<String>,
) -> Template {
    let mut view = views::payment_method_form(existing, error);
    if let Some(form) = form {
        view.name = form.name.clone();
    }
    Template::render("payment_method_form", serde_json::json!({ "view": view }))
}

fn load_method(pool: &DbPool, user_id: i64, id: i64) -> Result<PaymentMethod, AppError> {
    let conn = pool.get()?;
    db::payment_method(&conn, user_id, id)?.ok_or(AppError::NotFound("payment method"))
}

#[get("/payment-methods/new")]
fn new_payment_method(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Result<Template, Redirect> {
    require_user(pool, cookies)?;
    Ok(render_form(None, None, None))
}

#[get("/payment-methods/<id>/edit")]
fn edit_payment_method(
    pool: &State<DbPool>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Result<Template, Redirect> {
    let user = require_user(pool, cookies)?;
    let method = load_method(pool, user.id, id).map_err(|err| {
        tracing::warn!(error = %err, id, "cannot edit payment method");
        Redirect::to("/wallet")
    })?;
    Ok(render_form(Some(&method), None, None))
}

#[post("/payment-methods", data = "<form>")]
fn create_payment_method(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    form: Form<PaymentMethodForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let form = form.into_inner();
    let draft = form
        .validate()
        .map_err(|err| render_form(None, Some(&form), Some(err.to_string())))?;
    Mutations::new(pool, cache, user.id)
        .create_payment_method(&draft)
        .map_err(|err| render_form(None, Some(&form), Some(save_failed_message(&err))))?;
    Ok(Redirect::to("/wallet"))
}

#[post("/payment-methods/<id>", data = "<form>")]
fn update_payment_method(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
    form: Form<PaymentMethodForm>,
) -> Result<Redirect, Template> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let existing = load_method(pool, user.id, id).ok();
    let form = form.into_inner();
    let draft = form
        .validate()
        .map_err(|err| render_form(existing.as_ref(), Some(&form), Some(err.to_string())))?;
    Mutations::new(pool, cache, user.id)
        .update_payment_method(id, &draft)
        .map_err(|err| render_form(existing.as_ref(), Some(&form), Some(save_failed_message(&err))))?;
    Ok(Redirect::to("/wallet"))
}

#[post("/payment-methods/<id>/delete")]
fn delete_payment_method(
    pool: &State<DbPool>,
    cache: &State<QueryCache>,
    cookies: &CookieJar<'_>,
    id: i64,
) -> Result<Redirect, AppError> {
    let user = match require_user(pool, cookies) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    Mutations::new(pool, cache, user.id).delete_payment_method(id)?;
    Ok(Redirect::to("/wallet"))
}
