use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AttendanceStatus, Booking};
use crate::services::auth;
use crate::services::permanence;
use crate::services::scheduling::{local_day_end, local_day_start, validate_booking_time};
use crate::state::AppState;

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {value}")))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub court_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub time_slot: String,
    pub client_id: Option<String>,
    pub client_name: String,
    #[serde(default)]
    pub deposit: f64,
    pub status: Option<AttendanceStatus>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::require_user(&state, &headers)?;

    let date = parse_date(&body.date)?;
    let now = Utc::now();
    let booking_date = validate_booking_time(date, &body.time_slot, actor.role, now)?;

    let conn = state.db.lock().unwrap();

    // An explicit id wins and is taken as-is; otherwise try to match the
    // trimmed name, and fall back to a client-less booking.
    let client_id = match body.client_id {
        Some(id) => Some(id),
        None => queries::find_client_by_name(&conn, body.client_name.trim())?.map(|c| c.id),
    };

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: actor.id.clone(),
        court_id: body.court_id,
        date: booking_date,
        time_slot: body.time_slot,
        client_id,
        client_name: body.client_name,
        deposit: body.deposit,
        status: body.status,
        is_permanent: false,
        permanent_end_date: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&conn, &booking)?;

    if let Some(client_id) = &booking.client_id {
        queries::add_client_booking(&conn, client_id, &booking.id)?;
    }

    state.audit.record(
        &conn,
        &actor.name,
        &format!(
            "created booking for {} on {} at {}",
            booking.client_name, body.date, booking.time_slot
        ),
    );

    Ok(Json(booking))
}

// GET /api/bookings/court/:court_id
pub async fn get_bookings_by_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(court_id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::bookings_for_court(&conn, &court_id)?))
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
}

// GET /api/bookings/court/:court_id/range
pub async fn get_bookings_by_range(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(court_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    auth::require_user(&state, &headers)?;

    let start = local_day_start(parse_date(&query.start_date)?);
    let end = local_day_end(parse_date(&query.end_date)?);

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::bookings_for_court_in_range(
        &conn, &court_id, &start, &end,
    )?))
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub deposit: Option<f64>,
    pub status: Option<AttendanceStatus>,
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let mut booking = queries::find_booking(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    let previous_client = booking.client_id.clone();

    if let Some(name) = &body.client_name {
        if !name.is_empty() {
            booking.client_name = name.clone();
        }
    }
    if let Some(deposit) = body.deposit {
        booking.deposit = deposit;
    }
    if let Some(status) = body.status {
        booking.status = Some(status);
    }

    // The reference is re-resolved from the request alone: an explicit id
    // wins, then a name match; no match leaves the booking client-less.
    let new_client = match body.client_id {
        Some(client_id) => Some(client_id),
        None => match body.client_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => queries::find_client_by_name(&conn, name)?.map(|c| c.id),
            None => None,
        },
    };

    booking.client_id = new_client.clone();
    booking.updated_at = Utc::now();
    queries::update_booking(&conn, &booking)?;

    if previous_client != new_client {
        if let Some(prev) = &previous_client {
            queries::remove_client_booking(&conn, prev, &booking.id)?;
        }
        if let Some(new) = &new_client {
            queries::add_client_booking(&conn, new, &booking.id)?;
        }
    }

    state
        .audit
        .record(&conn, &actor.name, &format!("updated booking {}", booking.id));

    Ok(Json(booking))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let booking = queries::find_booking(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if let Some(client_id) = &booking.client_id {
        queries::remove_client_booking(&conn, client_id, &booking.id)?;
    }
    queries::delete_booking(&conn, &booking.id)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("deleted booking {}", booking.id));

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct PermanenceRequest {
    pub is_permanent: bool,
}

// PUT /api/bookings/:id/permanent
pub async fn set_permanence(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PermanenceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let mut conn = state.db.lock().unwrap();
    let booking = queries::find_booking(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let now = Utc::now();

    if body.is_permanent {
        let outcome = permanence::activate(&mut conn, &booking, now)?;
        state.audit.record(
            &conn,
            &actor.name,
            &format!("made booking {} permanent", booking.id),
        );
        Ok(Json(serde_json::json!({
            "ok": true,
            "created": outcome.created,
            "permanent_end_date": outcome.end_date,
        })))
    } else {
        let outcome = permanence::deactivate(&mut conn, &booking, now)?;
        state.audit.record(
            &conn,
            &actor.name,
            &format!("removed permanence from booking {}", booking.id),
        );
        Ok(Json(serde_json::json!({
            "ok": true,
            "kept": outcome.kept,
            "removed": outcome.removed,
        })))
    }
}
