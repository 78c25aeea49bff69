//! Request handlers for the `/students` resource collection.
//!
//! Each handler makes one or two calls on the [`StudentService`] held in
//! [`AppState`] and maps the outcome to a status code. Client errors carry
//! no body.
//!
//! [`StudentService`]: crate::services::StudentService

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        OriginalUri, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;

use crate::models::{Student, StudentId};
use crate::services::record_operation;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn outcome_of(err: &AppError) -> &'static str {
    match err {
        AppError::ValidationError(_) | AppError::BadRequest(_) => "invalid",
        AppError::NotFound(_) => "not_found",
        _ => "error",
    }
}

fn student_id(path: Result<Path<StudentId>, PathRejection>) -> Result<StudentId, AppError> {
    let Path(id) = path.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    tracing::Span::current().record("student_id", id);
    Ok(id)
}

fn student_body(payload: Result<Json<Student>, JsonRejection>) -> Result<Student, AppError> {
    let Json(student) = payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    Ok(student)
}

/// Existence pre-check shared by get, update and delete.
async fn find_existing(state: &AppState, id: StudentId) -> Result<Student, AppError> {
    state
        .students
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found: {}", id)))
}

/// GET /students
#[tracing::instrument(skip_all)]
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<StudentListResponse>, AppError> {
    let students = state
        .students
        .list_all()
        .await
        .inspect_err(|e| record_operation("list", outcome_of(e)))?;

    record_operation("list", "ok");

    let diagnostics = &state.config.diagnostics;
    Ok(Json(StudentListResponse {
        students,
        message: diagnostics.enabled.then(|| diagnostics.message.clone()),
        timestamp: diagnostics.enabled.then(Utc::now),
    }))
}

/// GET /students/:id
#[tracing::instrument(skip_all, fields(student_id))]
pub async fn get_student(
    State(state): State<AppState>,
    path: Result<Path<StudentId>, PathRejection>,
) -> Result<Json<Student>, AppError> {
    let student = async {
        let id = student_id(path)?;
        find_existing(&state, id).await
    }
    .await
    .inspect_err(|e| record_operation("get", outcome_of(e)))?;

    record_operation("get", "ok");
    Ok(Json(student))
}

/// POST /students
///
/// Any id in the body is ignored; the store assigns one. Responds 201 with
/// a `Location` pointing at the new record and no body.
#[tracing::instrument(skip_all, fields(student_id))]
pub async fn create_student(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<Student>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let saved = async {
        let student = student_body(payload)?;
        state.students.save(student.without_id()).await
    }
    .await
    .inspect_err(|e| record_operation("create", outcome_of(e)))?;

    let id = saved
        .id
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Saved student has no id")))?;
    tracing::Span::current().record("student_id", id);

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);

    record_operation("create", "ok");
    tracing::info!(location = %location, "Student created");

    Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
}

/// PUT /students/:id
///
/// The stored record always takes the path id, whatever the body says.
#[tracing::instrument(skip_all, fields(student_id))]
pub async fn update_student(
    State(state): State<AppState>,
    path: Result<Path<StudentId>, PathRejection>,
    payload: Result<Json<Student>, JsonRejection>,
) -> Result<Json<Student>, AppError> {
    let saved = async {
        let id = student_id(path)?;
        let student = student_body(payload)?;
        find_existing(&state, id).await?;
        state.students.save(student.with_id(id)).await
    }
    .await
    .inspect_err(|e| record_operation("update", outcome_of(e)))?;

    record_operation("update", "ok");
    tracing::info!("Student updated");

    Ok(Json(saved))
}

/// DELETE /students/:id
#[tracing::instrument(skip_all, fields(student_id))]
pub async fn delete_student(
    State(state): State<AppState>,
    path: Result<Path<StudentId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    async {
        let id = student_id(path)?;
        find_existing(&state, id).await?;
        state.students.delete_by_id(id).await
    }
    .await
    .inspect_err(|e| record_operation("delete", outcome_of(e)))?;

    record_operation("delete", "ok");
    tracing::info!("Student deleted");

    Ok(StatusCode::OK)
}
