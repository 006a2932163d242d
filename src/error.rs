use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::query::Column;

/// Failures raised while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// A uniqueness constraint rejected the write. `column` is `None` when the
    /// violated constraint does not map onto a known column.
    #[error("{message}")]
    Conflict {
        column: Option<Column>,
        message: String,
    },

    #[error("{0}")]
    Query(#[source] sqlx::Error),

    #[error("invalid command: {0}")]
    InvalidCommand(&'static str),
}

impl StoreError {
    /// Classifies a driver error, resolving unique violations to the column
    /// named by the violated constraint.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let column = db.constraint().and_then(Column::from_unique_constraint);
                return StoreError::Conflict {
                    column,
                    message: db.message().to_string(),
                };
            }
        }
        StoreError::Query(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from_sqlx(err)
    }
}

/// Errors surfaced at the route boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("{0}")]
    InvalidField(String),

    #[error("{0} already exists")]
    Duplicate(Column),

    #[error("{0}")]
    Conflict(String),

    #[error("user not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFields(_)
            | AppError::InvalidField(_)
            | AppError::Duplicate(_)
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                column: Some(column),
                ..
            } => AppError::Duplicate(column),
            StoreError::Conflict {
                column: None,
                message,
            } => AppError::Conflict(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::MissingFields("username, email and password are required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Duplicate(Column::Email).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_message_names_the_column() {
        assert_eq!(
            AppError::Duplicate(Column::Username).to_string(),
            "username already exists"
        );
        assert_eq!(
            AppError::Duplicate(Column::Email).to_string(),
            "email already exists"
        );
    }

    #[test]
    fn store_conflicts_map_to_request_errors() {
        let known: AppError = StoreError::Conflict {
            column: Some(Column::Email),
            message: "duplicate key value violates unique constraint \"users_email_key\"".into(),
        }
        .into();
        assert!(matches!(known, AppError::Duplicate(Column::Email)));

        let unknown: AppError = StoreError::Conflict {
            column: None,
            message: "duplicate key".into(),
        }
        .into();
        assert!(matches!(unknown, AppError::Conflict(ref m) if m == "duplicate key"));
    }

    #[test]
    fn driver_errors_become_internal_with_raw_message() {
        let err: AppError = StoreError::Query(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("no rows"));
    }
}
