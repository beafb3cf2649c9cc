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
    models::{CreatePracticeRequest, DataResponse, MessageResponse, UpdatePracticeRequest},
    repository::{NewPractice, PracticePatch},
    validate,
};

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuery {
    pub concert_id: Option<Uuid>,
    pub id: Option<Uuid>,
}

use super::DeleteQuery;

/// get_practices
///
/// [Session Route] Fetches one practice by id, or lists a concert's practices
/// earliest-start-first.
#[utoipa::path(
    get,
    path = "/practices",
    params(PracticeQuery),
    responses(
        (status = 200, description = "Practice(s)"),
        (status = 404, description = "Practice not found")
    )
)]
pub async fn get_practices(
    State(state): State<AppState>,
    Query(query): Query<PracticeQuery>,
) -> Result<Response, ApiError> {
    if let Some(id) = query.id {
        let practice = state
            .repo
            .get_practice(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("practice not found".to_string()))?;
        return Ok(Json(DataResponse::new(practice)).into_response());
    }

    let concert_id = query
        .concert_id
        .ok_or_else(|| ApiError::Validation("concertId is required".to_string()))?;
    let practices = state.repo.list_practices(concert_id).await?;
    Ok(Json(DataResponse::new(practices)).into_response())
}

/// create_practice
///
/// [Admin Route] Creates a rehearsal entry. Both timestamps are parsed and the
/// end-after-start invariant is enforced before anything is persisted, so a
/// rejected interval never leaves a record behind.
#[utoipa::path(
    post,
    path = "/practices",
    request_body = CreatePracticeRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Parent concert not found")
    )
)]
pub async fn create_practice(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePracticeRequest>,
) -> Result<Response, ApiError> {
    validate::required("title", &payload.title)?;
    validate::required("venue", &payload.venue)?;
    let start_time = validate::datetime("startTime", &payload.start_time)?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(|raw| validate::datetime("endTime", raw))
        .transpose()?;
    validate::end_after_start(start_time, end_time)?;

    let practice = state
        .repo
        .create_practice(NewPractice {
            concert_id: payload.concert_id,
            title: payload.title,
            start_time,
            end_time,
            venue: payload.venue,
            address: payload.address,
            items: payload.items,
            notes: payload.notes,
            memo: payload.memo,
            audio_url: payload.audio_url,
            video_url: payload.video_url,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("concert not found".to_string()))?;

    tracing::info!(practice_id = %practice.id, created_by = %user_id, "practice created");
    Ok(Json(DataResponse::new(practice)).into_response())
}

/// update_practice
///
/// [Admin Route] Merge-patch update. The interval invariant is checked against
/// the *merged* record: moving only the start or only the end can never invert
/// the interval.
#[utoipa::path(
    put,
    path = "/practices",
    request_body = UpdatePracticeRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Practice not found")
    )
)]
pub async fn update_practice(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePracticeRequest>,
) -> Result<Response, ApiError> {
    let existing = state
        .repo
        .get_practice(payload.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("practice not found".to_string()))?;

    let start_time = payload
        .start_time
        .as_deref()
        .map(|raw| validate::datetime("startTime", raw))
        .transpose()?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(|raw| validate::datetime("endTime", raw))
        .transpose()?;

    let merged_start = start_time.unwrap_or(existing.start_time);
    let merged_end = end_time.or(existing.end_time);
    validate::end_after_start(merged_start, merged_end)?;

    let practice = state
        .repo
        .update_practice(PracticePatch {
            id: payload.id,
            title: payload.title,
            start_time,
            end_time,
            venue: payload.venue,
            address: payload.address,
            items: payload.items,
            notes: payload.notes,
            memo: payload.memo,
            audio_url: payload.audio_url,
            video_url: payload.video_url,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("practice not found".to_string()))?;

    tracing::info!(practice_id = %practice.id, updated_by = %user_id, "practice updated");
    Ok(Json(DataResponse::new(practice)).into_response())
}

/// delete_practice
///
/// [Admin Route] Physical delete; retrying reports 404.
#[utoipa::path(
    delete,
    path = "/practices",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Practice not found")
    )
)]
pub async fn delete_practice(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    if !state.repo.delete_practice(id).await? {
        return Err(ApiError::NotFound("practice not found".to_string()));
    }

    tracing::info!(practice_id = %id, deleted_by = %user_id, "practice deleted");
    Ok(Json(MessageResponse::ok("practice deleted")).into_response())
}
