use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::state::AppState;

const SESSION_DURATION_DAYS: i64 = 7;
const TOKEN_LENGTH: usize = 32;

#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, stored: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Validation("invalid credentials".to_string()))
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn create_session(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let session = Session {
        token: random_token(),
        expires_at: now + Duration::days(SESSION_DURATION_DAYS),
    };
    queries::insert_session(conn, &session.token, user_id, &session.expires_at)?;
    Ok(session)
}

/// Verifies credentials and opens a session. Expired sessions are swept on
/// every login.
pub fn login(
    conn: &Connection,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<(Session, User), AppError> {
    queries::clear_expired_sessions(conn, &now)?;

    let user = queries::find_user_by_email(conn, email)?
        .ok_or_else(|| AppError::Validation("invalid credentials".to_string()))?;

    verify_password(password, &user.password)?;

    let session = create_session(conn, &user.id, now)?;
    Ok((session, user))
}

pub fn register(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<(Session, User), AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        role,
    };
    queries::insert_user(conn, &user)?;

    let session = create_session(conn, &user.id, now)?;
    Ok((session, user))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the acting user from the request's bearer token.
pub fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let conn = state.db.lock().unwrap();
    queries::user_for_session(&conn, token, &Utc::now())?.ok_or(AppError::Unauthorized)
}

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let user = require_user(state, headers)?;
    if user.role != Role::Admin {
        return Err(AppError::PermissionDenied);
    }
    Ok(user)
}

/// Creates the configured admin account on first start.
pub fn seed_admin(conn: &Connection, config: &AppConfig) -> Result<(), AppError> {
    if queries::find_user_by_email(conn, &config.admin_email)?.is_some() {
        return Ok(());
    }

    let admin = User {
        id: Uuid::new_v4().to_string(),
        name: config.admin_name.clone(),
        email: config.admin_email.clone(),
        password: hash_password(&config.admin_password)?,
        role: Role::Admin,
    };
    queries::insert_user(conn, &admin)?;
    tracing::info!(email = %config.admin_email, "admin user created");
    Ok(())
}
