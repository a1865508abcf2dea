// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP router and error-to-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::Error;
use crate::handlers::{self, AppState};

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Human-readable error message.
    error: String,
    /// Offending payload field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl Error {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::CourseNotFound(_) | Error::SectionNotFound(_) | Error::ResourceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Error::Validation { field, message } => ErrorBody {
                error: message.clone(),
                field: Some(field.clone()),
            },
            Error::CourseNotFound(_) | Error::SectionNotFound(_) | Error::ResourceNotFound(_) => {
                ErrorBody {
                    error: self.to_string(),
                    field: None,
                }
            }
            Error::Conflict(message) => ErrorBody {
                error: message.clone(),
                field: None,
            },
            // Internal detail goes to the log, not the client.
            other => {
                error!(error = %other, "Request failed");
                ErrorBody {
                    error: "internal error".to_string(),
                    field: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/courses", post(handlers::create_course))
        .route(
            "/courses/{id}",
            get(handlers::get_course).patch(handlers::update_course),
        )
        .route("/courses/{id}/sections", post(handlers::create_section))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = Error::Validation {
            field: "start_date".to_string(),
            message: "must not be after end_date".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(Error::CourseNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::SectionNotFound(2).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::ResourceNotFound(3).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = Error::Conflict("retry".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_errors_map_to_500() {
        let err = Error::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
