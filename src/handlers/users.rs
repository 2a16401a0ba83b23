use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::services::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        email: body.email,
        password: auth::hash_password(&body.password)?,
        role: body.role.unwrap_or(Role::User),
    };

    let conn = state.db.lock().unwrap();
    queries::insert_user(&conn, &user)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("created user {}", user.name));

    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/users
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, AppError> {
    auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::list_users(&conn)?))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

// PUT /api/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let mut user = queries::find_user_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    if let Some(name) = body.name {
        user.name = name;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    if let Some(password) = body.password {
        user.password = auth::hash_password(&password)?;
    }
    if let Some(role) = body.role {
        user.role = role;
    }

    queries::update_user(&conn, &user)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("updated user {}", user.name));

    Ok(Json(user))
}

// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    if !queries::delete_user(&conn, &id)? {
        return Err(AppError::NotFound(format!("user {id}")));
    }

    state
        .audit
        .record(&conn, &actor.name, &format!("deleted user {id}"));

    Ok(Json(serde_json::json!({ "ok": true })))
}
