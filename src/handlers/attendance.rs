use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{CreateAttendanceFormRequest, DataResponse, MessageResponse, UpdateAttendanceFormRequest},
    repository::{AttendanceFormPatch, NewAttendanceForm},
    validate,
};

/// Query parameters for GET /attendance: `id` fetches a single form,
/// otherwise `concertId` is required and selects the listing.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub concert_id: Option<Uuid>,
    pub id: Option<Uuid>,
}

use super::DeleteQuery;

/// get_attendance_forms
///
/// [Session Route] Fetches one attendance form by id, or lists a concert's
/// forms newest-first.
#[utoipa::path(
    get,
    path = "/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance form(s)"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn get_attendance_forms(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Response, ApiError> {
    if let Some(id) = query.id {
        let form = state
            .repo
            .get_attendance_form(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("attendance form not found".to_string()))?;
        return Ok(Json(DataResponse::new(form)).into_response());
    }

    let concert_id = query
        .concert_id
        .ok_or_else(|| ApiError::Validation("concertId is required".to_string()))?;
    let forms = state.repo.list_attendance_forms(concert_id).await?;
    Ok(Json(DataResponse::new(forms)).into_response())
}

/// create_attendance_form
///
/// [Admin Route] Creates a form under a concert. The URL must be well-formed
/// and the parent concert must exist; the repository reports a missing parent
/// as an absent value, surfaced here as a 404.
#[utoipa::path(
    post,
    path = "/attendance",
    request_body = CreateAttendanceFormRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Parent concert not found")
    )
)]
pub async fn create_attendance_form(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAttendanceFormRequest>,
) -> Result<Response, ApiError> {
    validate::required("title", &payload.title)?;
    validate::url("url", &payload.url)?;

    let form = state
        .repo
        .create_attendance_form(NewAttendanceForm {
            concert_id: payload.concert_id,
            title: payload.title,
            url: payload.url,
            description: payload.description,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("concert not found".to_string()))?;

    tracing::info!(form_id = %form.id, created_by = %user_id, "attendance form created");
    Ok(Json(DataResponse::new(form)).into_response())
}

/// update_attendance_form
///
/// [Admin Route] Merge-patch update of a form's fields.
#[utoipa::path(
    put,
    path = "/attendance",
    request_body = UpdateAttendanceFormRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn update_attendance_form(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateAttendanceFormRequest>,
) -> Result<Response, ApiError> {
    if let Some(url) = payload.url.as_deref() {
        validate::url("url", url)?;
    }

    let form = state
        .repo
        .update_attendance_form(AttendanceFormPatch {
            id: payload.id,
            title: payload.title,
            url: payload.url,
            description: payload.description,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("attendance form not found".to_string()))?;

    tracing::info!(form_id = %form.id, updated_by = %user_id, "attendance form updated");
    Ok(Json(DataResponse::new(form)).into_response())
}

/// delete_attendance_form
///
/// [Admin Route] Physical, irreversible delete. Retrying a completed delete
/// reports 404.
#[utoipa::path(
    delete,
    path = "/attendance",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Form not found")
    )
)]
pub async fn delete_attendance_form(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    if !state.repo.delete_attendance_form(id).await? {
        return Err(ApiError::NotFound("attendance form not found".to_string()));
    }

    tracing::info!(form_id = %id, deleted_by = %user_id, "attendance form deleted");
    Ok(Json(MessageResponse::ok("attendance form deleted")).into_response())
}
