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
    models::{CreateConcertRequest, DataResponse, MessageResponse, UpdateConcertRequest},
    repository::ConcertPatch,
    validate,
};

/// ConcertQuery
///
/// Query parameters for GET /concerts: `id` switches the endpoint into detail
/// mode (concert plus children), `active=true` filters the listing to active
/// concerts.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ConcertQuery {
    pub active: Option<bool>,
    pub id: Option<Uuid>,
}

use super::DeleteQuery;

/// get_concerts
///
/// [Session Route] Lists concerts newest-updated-first, or fetches one concert
/// with its full child collections when `id` is given. Detail fetches ignore
/// the active flag: a soft-deleted concert stays reachable by id.
#[utoipa::path(
    get,
    path = "/concerts",
    params(ConcertQuery),
    responses(
        (status = 200, description = "Concert list or detail"),
        (status = 404, description = "Concert not found")
    )
)]
pub async fn get_concerts(
    State(state): State<AppState>,
    Query(query): Query<ConcertQuery>,
) -> Result<Response, ApiError> {
    if let Some(id) = query.id {
        let detail = state
            .repo
            .get_concert_detail(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("concert not found".to_string()))?;
        return Ok(Json(DataResponse::new(detail)).into_response());
    }

    let concerts = state.repo.list_concerts(query.active.unwrap_or(false)).await?;
    Ok(Json(DataResponse::new(concerts)).into_response())
}

/// create_concert
///
/// [Admin Route] Creates a concert. The date arrives as an RFC 3339 string and
/// is parsed before anything touches the repository.
#[utoipa::path(
    post,
    path = "/concerts",
    request_body = CreateConcertRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_concert(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateConcertRequest>,
) -> Result<Response, ApiError> {
    validate::required("title", &payload.title)?;
    validate::required("venue", &payload.venue)?;
    let date = validate::datetime("date", &payload.date)?;

    let concert = state
        .repo
        .create_concert(payload.title, date, payload.venue)
        .await?;

    tracing::info!(concert_id = %concert.id, created_by = %user_id, "concert created");
    Ok(Json(DataResponse::new(concert)).into_response())
}

/// update_concert
///
/// [Admin Route] Merge-patch update: only supplied fields are written. Setting
/// `isActive=true` here is the explicit way back from a soft delete.
#[utoipa::path(
    put,
    path = "/concerts",
    request_body = UpdateConcertRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Concert not found")
    )
)]
pub async fn update_concert(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateConcertRequest>,
) -> Result<Response, ApiError> {
    let date = payload
        .date
        .as_deref()
        .map(|raw| validate::datetime("date", raw))
        .transpose()?;

    let patch = ConcertPatch {
        id: payload.id,
        title: payload.title,
        date,
        venue: payload.venue,
        is_active: payload.is_active,
    };

    let concert = state
        .repo
        .update_concert(patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("concert not found".to_string()))?;

    tracing::info!(concert_id = %concert.id, updated_by = %user_id, "concert updated");
    Ok(Json(DataResponse::new(concert)).into_response())
}

/// delete_concert
///
/// [Admin Route] Logical delete only: flips `isActive` to false and leaves all
/// children intact. Repeating the call on an already-inactive concert still
/// succeeds; only a missing id is a 404.
#[utoipa::path(
    delete,
    path = "/concerts",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deactivated", body = MessageResponse),
        (status = 404, description = "Concert not found")
    )
)]
pub async fn delete_concert(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    if !state.repo.deactivate_concert(id).await? {
        return Err(ApiError::NotFound("concert not found".to_string()));
    }

    tracing::info!(concert_id = %id, deleted_by = %user_id, "concert deactivated");
    Ok(Json(MessageResponse::ok("concert deleted")).into_response())
}
