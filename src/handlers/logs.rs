use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::LogEntry;
use crate::services::auth;
use crate::state::AppState;

// GET /api/logs
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::list_logs(&conn)?))
}
