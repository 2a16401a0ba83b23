use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Client};
use crate::services::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClientRequest {
    pub name: String,
    pub phone: String,
}

// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let client = Client {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        phone: body.phone.trim().to_string(),
        bookings: vec![],
    };
    queries::insert_client(&conn, &client)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("created client {}", client.name));

    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients
pub async fn get_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Client>>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::list_clients(&conn)?))
}

// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ClientRequest>,
) -> Result<Json<Client>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    if queries::find_client(&conn, &id)?.is_none() {
        return Err(AppError::NotFound(format!("client {id}")));
    }

    queries::update_client(&conn, &id, body.name.trim(), body.phone.trim())?;
    let client = queries::find_client(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;

    state
        .audit
        .record(&conn, &actor.name, &format!("updated client {}", client.name));

    Ok(Json(client))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let client = queries::find_client(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;

    queries::delete_client(&conn, &id)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("deleted client {}", client.name));

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Serialize)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
    pub phone: String,
}

#[derive(Serialize)]
pub struct ClientStatsResponse {
    pub client: ClientRef,
    pub total_bookings: i64,
    pub arrived_bookings: i64,
    pub arrival_rate: f64,
    pub total_deposit: f64,
    pub avg_deposit: f64,
    pub last_booking: Option<DateTime<Utc>>,
}

// GET /api/clients/:id/stats
pub async fn get_client_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ClientStatsResponse>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let client = queries::find_client(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;

    let stats = queries::client_aggregate(&conn, &client.id, &client.name)?;
    let arrival_rate = if stats.total_bookings > 0 {
        stats.arrived_bookings as f64 / stats.total_bookings as f64
    } else {
        0.0
    };

    Ok(Json(ClientStatsResponse {
        client: ClientRef {
            id: client.id,
            name: client.name,
            phone: client.phone,
        },
        total_bookings: stats.total_bookings,
        arrived_bookings: stats.arrived_bookings,
        arrival_rate,
        total_deposit: stats.total_deposit,
        avg_deposit: stats.avg_deposit,
        last_booking: stats.last_booking,
    }))
}

#[derive(Serialize)]
pub struct ClientBookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub court_name: String,
}

// GET /api/clients/:id/bookings
pub async fn get_client_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<ClientBookingResponse>>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let client = queries::find_client(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;

    let bookings = queries::client_bookings_with_court(&conn, &client.id, &client.name)?
        .into_iter()
        .map(|(booking, court_name)| ClientBookingResponse {
            booking,
            court_name,
        })
        .collect();

    Ok(Json(bookings))
}
