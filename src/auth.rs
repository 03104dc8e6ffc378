use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::SaltString;
use rand_core::OsRng;
use rocket::http::{Cookie, CookieJar, SameSite};
use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::AppError;
use crate::models::User;

pub const SESSION_COOKIE: &str = "session";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered")]
    AlreadyRegistered,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password should be at least 6 characters")]
    PasswordTooShort,
    #[error("Email and password are required")]
    MissingFields,
    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Store(err.into())
    }
}

impl From<r2d2::Error> for AuthError {
    fn from(err: r2d2::Error) -> Self {
        AuthError::Store(err.into())
    }
}

impl AuthError {
    /// Korean text for the login page; store failures pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "이메일 또는 비밀번호가 올바르지 않습니다.".to_string(),
            AuthError::AlreadyRegistered => "이미 가입된 이메일입니다.".to_string(),
            AuthError::PasswordMismatch => "비밀번호가 일치하지 않습니다.".to_string(),
            AuthError::PasswordTooShort => {
                format!("비밀번호는 {MIN_PASSWORD_LEN}자 이상이어야 합니다.")
            }
            AuthError::MissingFields => "이메일과 비밀번호를 입력해주세요.".to_string(),
            AuthError::Store(err) => err.to_string(),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Hash)?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation)
}

fn open_session(conn: &rusqlite::Connection, user_id: i64, max_sessions: i64) -> Result<String, AuthError> {
    let token = Uuid::new_v4().to_string();
    db::create_session(conn, user_id, &token)?;
    db::prune_sessions(conn, user_id, max_sessions)?;
    Ok(token)
}

/// Registers the account, seeds its default categories and wallet, and
/// returns a fresh session token.
pub fn sign_up(
    pool: &DbPool,
    email: &str,
    password: &str,
    confirm_password: &str,
    max_sessions: i64,
) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }

    let conn = pool.get()?;
    if db::user_credentials(&conn, &email)?.is_some() {
        return Err(AuthError::AlreadyRegistered);
    }
    let password_hash = hash_password(password)?;
    let user_id = db::insert_user(&conn, &email, &password_hash).map_err(|err| {
        if is_unique_violation(&err) {
            AuthError::AlreadyRegistered
        } else {
            err.into()
        }
    })?;
    db::seed_defaults(&conn, user_id)?;
    tracing::info!(user_id, "account created");
    open_session(&conn, user_id, max_sessions)
}

pub fn sign_in(
    pool: &DbPool,
    email: &str,
    password: &str,
    max_sessions: i64,
) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    let conn = pool.get()?;
    let Some((user_id, hash)) = db::user_credentials(&conn, &email)? else {
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(&hash, password) {
        tracing::info!(user_id, "rejected sign-in");
        return Err(AuthError::InvalidCredentials);
    }
    tracing::info!(user_id, "signed in");
    open_session(&conn, user_id, max_sessions)
}

pub fn sign_out(pool: &DbPool, token: &str) -> Result<(), AppError> {
    let conn = pool.get()?;
    db::delete_session(&conn, token)?;
    Ok(())
}

pub fn current_user(pool: &DbPool, token: &str) -> Option<User> {
    let conn = pool.get().ok()?;
    db::user_by_session(&conn, token).ok().flatten()
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, token: String) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[test]
    fn passwords_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password(&hash, "hunter22"));
        assert!(!verify_password(&hash, "hunter23"));
        assert!(!verify_password("not-a-hash", "hunter22"));
    }

    #[test]
    fn sign_up_seeds_and_opens_session() {
        let (_dir, pool) = test_pool();
        let token = sign_up(&pool, " New@Example.com ", "secret1", "secret1", 5).unwrap();
        let user = current_user(&pool, &token).unwrap();
        assert_eq!(user.email, "new@example.com");

        let conn = pool.get().unwrap();
        assert_eq!(db::list_categories(&conn, user.id).unwrap().len(), 10);
        assert_eq!(db::list_payment_methods(&conn, user.id).unwrap()[0].name, "현금");
    }

    #[test]
    fn sign_up_validation_messages() {
        let (_dir, pool) = test_pool();
        let mismatch = sign_up(&pool, "a@example.com", "secret1", "secret2", 5).unwrap_err();
        assert_eq!(mismatch.user_message(), "비밀번호가 일치하지 않습니다.");
        let short = sign_up(&pool, "a@example.com", "12345", "12345", 5).unwrap_err();
        assert_eq!(short.user_message(), "비밀번호는 6자 이상이어야 합니다.");

        sign_up(&pool, "a@example.com", "secret1", "secret1", 5).unwrap();
        let again = sign_up(&pool, "A@example.com", "secret1", "secret1", 5).unwrap_err();
        assert_eq!(again.user_message(), "이미 가입된 이메일입니다.");
    }

    #[test]
    fn sign_in_rejects_bad_credentials() {
        let (_dir, pool) = test_pool();
        sign_up(&pool, "login@example.com", "secret1", "secret1", 5).unwrap();

        let wrong = sign_in(&pool, "login@example.com", "nope123", 5).unwrap_err();
        assert_eq!(wrong.user_message(), "이메일 또는 비밀번호가 올바르지 않습니다.");
        let unknown = sign_in(&pool, "ghost@example.com", "secret1", 5).unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));

        let token = sign_in(&pool, "login@example.com", "secret1", 5).unwrap();
        sign_out(&pool, &token).unwrap();
        assert!(current_user(&pool, &token).is_none());
    }

    #[test]
    fn sign_in_prunes_old_sessions() {
        let (_dir, pool) = test_pool();
        let first = sign_up(&pool, "many@example.com", "secret1", "secret1", 2).unwrap();
        sign_in(&pool, "many@example.com", "secret1", 2).unwrap();
        let last = sign_in(&pool, "many@example.com", "secret1", 2).unwrap();
        assert!(current_user(&pool, &first).is_none());
        assert!(current_user(&pool, &last).is_some());
    }
}
