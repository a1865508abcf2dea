// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP request handlers for the course lifecycle boundary.
//!
//! Thin layer: deserialize, delegate to [`CourseLifecycleService`], map the
//! result. All validation and transaction discipline lives in the service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use kurso_core::model::{CourseTree, DesiredSection, Section};

use crate::db;
use crate::error::Result;
use crate::lifecycle::{CourseLifecycleService, NewCourse, NewSection, UpdateCourseFields};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle façade all handlers delegate to.
    pub lifecycle: Arc<CourseLifecycleService>,
}

/// Body of `PATCH /courses/{id}`: scalar field updates plus an optional
/// desired-sections tree. Absence of `sections` leaves content untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCourseRequest {
    /// Scalar field updates.
    #[serde(flatten)]
    pub fields: UpdateCourseFields,
    /// Desired content tree, when the edit includes content.
    #[serde(default)]
    pub sections: Option<Vec<DesiredSection>>,
}

/// `GET /health`: database connectivity probe.
pub async fn health(State(state): State<AppState>) -> Response {
    match db::health_check(state.lifecycle.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "ok"}))).into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable"})),
            )
                .into_response()
        }
    }
}

/// `POST /courses`: create a course.
pub async fn create_course(
    State(state): State<AppState>,
    Json(new): Json<NewCourse>,
) -> Result<(StatusCode, Json<CourseTree>)> {
    let tree = state.lifecycle.create_course(new).await?;
    Ok((StatusCode::CREATED, Json(tree)))
}

/// `GET /courses/{id}`: a course with its full nested content.
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseTree>> {
    Ok(Json(state.lifecycle.get_course(course_id).await?))
}

/// `PATCH /courses/{id}`: update scalar fields and optionally reconcile
/// content. Returns the reconciled course for confirmation.
pub async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<CourseTree>> {
    let tree = state
        .lifecycle
        .update_course(course_id, req.fields, req.sections.as_deref())
        .await?;
    Ok(Json(tree))
}

/// `POST /courses/{id}/sections`: create a single section, allocating the
/// next position when none is supplied.
pub async fn create_section(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(new): Json<NewSection>,
) -> Result<(StatusCode, Json<Section>)> {
    let section = state.lifecycle.create_section(course_id, new).await?;
    Ok((StatusCode::CREATED, Json(section)))
}
