use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("access denied")]
    PermissionDenied,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate value for {field}")]
    Conflict { field: String },

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        // SQLite reports unique-index violations as a constraint failure whose
        // message names the colliding column ("UNIQUE constraint failed:
        // clients.name").
        if let rusqlite::Error::SqliteFailure(inner, Some(message)) = &err {
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
                && message.starts_with("UNIQUE constraint failed")
            {
                let field = message
                    .rsplit('.')
                    .next()
                    .unwrap_or("field")
                    .trim()
                    .to_string();
                return AppError::Conflict { field };
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            // Store failures stay out of responses.
            AppError::Database(e) => {
                tracing::error!(error = %e, "request failed on a store operation");
                serde_json::json!({ "error": "internal server error" })
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                serde_json::json!({ "error": "internal server error" })
            }
            AppError::Conflict { field } => {
                serde_json::json!({ "error": self.to_string(), "field": field })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict_with_field() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE clients (name TEXT UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO clients (name) VALUES ('Ana')", [])
            .unwrap();

        let err = conn
            .execute("INSERT INTO clients (name) VALUES ('Ana')", [])
            .unwrap_err();

        match AppError::from(err) {
            AppError::Conflict { field } => assert_eq!(field, "name"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn other_sqlite_errors_stay_database_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }
}
