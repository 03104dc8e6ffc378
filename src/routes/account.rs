use rocket::State;
use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::Route;
use rocket_dyn_templates::Template;

use super::current_user;
use crate::auth::{self, SESSION_COOKIE};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::forms::{LoginForm, SignupForm};

pub fn routes() -> Vec<Route> {
    routes![login, login_post, signup_post, logout, auth_error]
}

fn render_login(mode: &str, email: &str, error: Option<&str>) -> Template {
    Template::render(
        "login",
        serde_json::json!({
            "mode": mode,
            "email": email,
            "error": error,
        }),
    )
}

#[get("/auth/login")]
fn login(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Result<Template, Redirect> {
    if current_user(pool, cookies).is_some() {
        return Err(Redirect::to("/"));
    }
    Ok(render_login("login", "", None))
}

#[post("/auth/login", data = "<form>")]
fn login_post(
    pool: &State<DbPool>,
    config: &State<AppConfig>,
    cookies: &CookieJar<'_>,
    form: Form<LoginForm>,
) -> Result<Redirect, Template> {
    let form = form.into_inner();
    let token = auth::sign_in(pool, &form.email, &form.password, config.max_sessions)
        .map_err(|err| render_login("login", &form.email, Some(&err.user_message())))?;
    auth::set_session_cookie(cookies, token);
    Ok(Redirect::to("/"))
}

#[post("/auth/signup", data = "<form>")]
fn signup_post(
    pool: &State<DbPool>,
    config: &State<AppConfig>,
    cookies: &CookieJar<'_>,
    form: Form<SignupForm>,
) -> Result<Redirect, Template> {
    let form = form.into_inner();
    let token = auth::sign_up(
        pool,
        &form.email,
        &form.password,
        &form.confirm_password,
        config.max_sessions,
    )
    .map_err(|err| render_login("signup", &form.email, Some(&err.user_message())))?;
    auth::set_session_cookie(cookies, token);
    Ok(Redirect::to("/"))
}

#[post("/auth/logout")]
fn logout(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        if let Err(err) = auth::sign_out(pool, cookie.value()) {
            tracing::warn!(error = %err, "failed to delete session");
        }
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(super::LOGIN_PATH)
}

#[get("/auth/error?<error>")]
fn auth_error(error: Option<String>) -> Template {
    Template::render(
        "auth_error",
        serde_json::json!({
            "error": error.filter(|code| !code.trim().is_empty()),
        }),
    )
}
