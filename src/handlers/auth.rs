use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Role, User};
use crate::services::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let conn = state.db.lock().unwrap();
    let (session, user) = auth::register(
        &conn,
        &body.name,
        &body.email,
        &body.password,
        body.role.unwrap_or(Role::User),
        Utc::now(),
    )?;
    state.audit.record(&conn, &user.name, "user registered");

    Ok(Json(SessionResponse {
        token: session.token,
        user,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let conn = state.db.lock().unwrap();
    let (session, user) = auth::login(&conn, &body.email, &body.password, Utc::now())?;
    state.audit.record(&conn, &user.name, "user authenticated");

    Ok(Json(SessionResponse {
        token: session.token,
        user,
    }))
}

#[derive(Deserialize)]
pub struct ReAuthRequest {
    pub password: String,
}

// POST /api/auth/re-auth
pub async fn re_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ReAuthRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_user(&state, &headers)?;
    auth::verify_password(&body.password, &actor.password)?;

    let conn = state.db.lock().unwrap();
    state.audit.record(&conn, &actor.name, "user re-authenticated");

    Ok(Json(serde_json::json!({ "ok": true })))
}
