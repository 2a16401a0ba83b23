use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::auth;
use crate::services::export;
use crate::services::scheduling::business_offset;
use crate::services::statistics::{self, ClientPeriodStats, FinancialStats};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PeriodQuery {
    #[serde(rename = "type")]
    pub period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> &str {
        self.period.as_deref().unwrap_or("week")
    }
}

// GET /api/stats/clients
pub async fn client_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<ClientPeriodStats>>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;
    let period = query.period();

    let conn = state.db.lock().unwrap();
    let stats = statistics::client_stats(&conn, period, Utc::now())?;

    state.audit.record(
        &conn,
        &actor.name,
        &format!("viewed client statistics ({period})"),
    );

    Ok(Json(stats))
}

// GET /api/stats/financial
pub async fn financial_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<FinancialStats>, AppError> {
    let actor = auth::require_admin(&state, &headers)?;
    let period = query.period();

    let conn = state.db.lock().unwrap();
    let stats = statistics::financial_stats(&conn, period, Utc::now())?;

    state.audit.record(
        &conn,
        &actor.name,
        &format!("viewed financial statistics ({period})"),
    );

    Ok(Json(stats))
}

fn csv_download(filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn local_today() -> String {
    Utc::now()
        .with_timezone(&business_offset())
        .format("%Y-%m-%d")
        .to_string()
}

// GET /api/stats/clients/export
pub async fn export_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let actor = auth::require_admin(&state, &headers)?;
    let period = query.period();

    let conn = state.db.lock().unwrap();
    let stats = statistics::client_stats(&conn, period, Utc::now())?;
    let csv = export::clients_csv(&stats);

    state.audit.record(
        &conn,
        &actor.name,
        &format!("exported client statistics ({period})"),
    );

    let filename = format!("clients_{period}_{}.csv", local_today());
    Ok(csv_download(filename, csv))
}

// GET /api/stats/financial/export
pub async fn export_financial(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let actor = auth::require_admin(&state, &headers)?;
    let period = query.period();

    let conn = state.db.lock().unwrap();
    let rows = statistics::financial_rows(&conn, period, Utc::now())?;
    let csv = export::financial_csv(&rows);

    state.audit.record(
        &conn,
        &actor.name,
        &format!("exported financial statistics ({period})"),
    );

    let filename = format!("financial_{period}_{}.csv", local_today());
    Ok(csv_download(filename, csv))
}
