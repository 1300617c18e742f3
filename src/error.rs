// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::error;

use crate::db::DbPoolError;

/// Error taxonomy for the API. Every failure surfaces to the caller as one
/// of these typed outcomes; duplicates are caller mistakes rather than
/// idempotent no-ops, and nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable viewer identity on the request.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch the resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    /// The store could not be reached at all.
    #[error("database unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other store-side failure.
    #[error("database error: {0}")]
    Database(DieselError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Duplicate(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The store's constraints are the authoritative guard for uniqueness and
/// self-reference rules, so constraint violations map onto the same typed
/// outcomes as the application-level fast-path checks.
impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ApiError::NotFound("record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Duplicate(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                ApiError::Validation(info.message().to_string())
            }
            other => ApiError::Database(other),
        }
    }
}

impl From<DbPoolError> for ApiError {
    fn from(err: DbPoolError) -> Self {
        ApiError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> DieselError {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        )
    }

    #[test]
    fn unique_violation_maps_to_duplicate() {
        let err = ApiError::from(unique_violation());
        assert!(matches!(err, ApiError::Duplicate(_)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn check_violation_maps_to_validation() {
        let err = ApiError::from(DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new("violates check constraint".to_string()),
        ));
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = ApiError::from(DieselError::NotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn status_codes_cover_the_taxonomy() {
        assert_eq!(
            ApiError::Unauthorized("auth required".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("not yours".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::StoreUnavailable("pool timeout".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
