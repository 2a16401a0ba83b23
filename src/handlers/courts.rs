use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Court, CourtPricing};
use crate::services::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCourtRequest {
    pub name: String,
    pub color: String,
    /// Also create the `(Original)` template twin with the same pricing.
    #[serde(default)]
    pub create_original: bool,
    #[serde(default)]
    pub pricing: CourtPricing,
}

// POST /api/courts
pub async fn create_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateCourtRequest>,
) -> Result<Json<Court>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let pricing = body.pricing.clamped();

    let court = Court {
        id: Uuid::new_v4().to_string(),
        name: body.name.clone(),
        color: body.color.clone(),
        is_original: false,
        pricing,
    };
    queries::insert_court(&conn, &court)?;

    if body.create_original {
        let original = Court {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (Original)", body.name),
            color: body.color,
            is_original: true,
            pricing,
        };
        queries::insert_court(&conn, &original)?;
    }

    state
        .audit
        .record(&conn, &actor.name, &format!("created court {}", court.name));

    Ok(Json(court))
}

// GET /api/courts
pub async fn get_courts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Court>>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::list_courts(&conn, false)?))
}

// GET /api/courts/originals
pub async fn get_original_courts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Court>>, AppError> {
    auth::require_user(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    Ok(Json(queries::list_courts(&conn, true)?))
}

#[derive(Deserialize)]
pub struct UpdateCourtRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub pricing: Option<UpdateCourtPricing>,
}

/// Per-bucket merge: absent buckets keep their current rate.
#[derive(Deserialize)]
pub struct UpdateCourtPricing {
    pub six_am: Option<f64>,
    pub seven_to_fifteen: Option<f64>,
    pub sixteen_to_twenty_one: Option<f64>,
    pub twenty_two: Option<f64>,
    pub twenty_three: Option<f64>,
}

// PUT /api/courts/:id
pub async fn update_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourtRequest>,
) -> Result<Json<Court>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let mut court = queries::find_court(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("court {id}")))?;

    if let Some(name) = body.name {
        if !name.is_empty() {
            court.name = name;
        }
    }
    if let Some(color) = body.color {
        if !color.is_empty() {
            court.color = color;
        }
    }
    if let Some(p) = body.pricing {
        court.pricing = CourtPricing {
            six_am: p.six_am.unwrap_or(court.pricing.six_am),
            seven_to_fifteen: p.seven_to_fifteen.unwrap_or(court.pricing.seven_to_fifteen),
            sixteen_to_twenty_one: p
                .sixteen_to_twenty_one
                .unwrap_or(court.pricing.sixteen_to_twenty_one),
            twenty_two: p.twenty_two.unwrap_or(court.pricing.twenty_two),
            twenty_three: p.twenty_three.unwrap_or(court.pricing.twenty_three),
        }
        .clamped();
    }

    queries::update_court(&conn, &court)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("updated court {}", court.name));

    Ok(Json(court))
}

// DELETE /api/courts/:id
pub async fn delete_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;

    let conn = state.db.lock().unwrap();
    let court = queries::find_court(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("court {id}")))?;

    queries::delete_court(&conn, &court.id)?;

    state
        .audit
        .record(&conn, &actor.name, &format!("deleted court {}", court.name));

    Ok(Json(serde_json::json!({ "ok": true })))
}
