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
    models::{CreateScoreRequest, DataResponse, UpdateScoreRequest},
    repository::{NewScore, ScorePatch},
    validate,
};

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ScoreQuery {
    pub concert_id: Option<Uuid>,
}

/// get_scores
///
/// [Session Route] Lists a concert's scores newest-updated-first, each with its
/// comment history newest-first.
#[utoipa::path(
    get,
    path = "/scores",
    params(ScoreQuery),
    responses(
        (status = 200, description = "Scores with comment history"),
        (status = 400, description = "Missing concertId")
    )
)]
pub async fn get_scores(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
) -> Result<Response, ApiError> {
    let concert_id = query
        .concert_id
        .ok_or_else(|| ApiError::Validation("concertId is required".to_string()))?;
    let scores = state.repo.list_scores(concert_id).await?;
    Ok(Json(DataResponse::new(scores)).into_response())
}

/// create_score
///
/// [Admin Route] Adds a score link under a concert. New scores start out valid.
#[utoipa::path(
    post,
    path = "/scores",
    request_body = CreateScoreRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Parent concert not found")
    )
)]
pub async fn create_score(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateScoreRequest>,
) -> Result<Response, ApiError> {
    validate::required("title", &payload.title)?;
    validate::url("url", &payload.url)?;

    let score = state
        .repo
        .create_score(NewScore {
            concert_id: payload.concert_id,
            title: payload.title,
            url: payload.url,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("concert not found".to_string()))?;

    tracing::info!(score_id = %score.id, created_by = %user_id, "score created");
    Ok(Json(DataResponse::new(score)).into_response())
}

/// update_score
///
/// [Admin Route] Merge-patch update. Supplying a non-empty `comment` appends
/// one immutable entry to the score's history atomically with the field update;
/// the comment itself can never be edited afterwards.
#[utoipa::path(
    put,
    path = "/scores",
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Score not found")
    )
)]
pub async fn update_score(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateScoreRequest>,
) -> Result<Response, ApiError> {
    if let Some(url) = payload.url.as_deref() {
        validate::url("url", url)?;
    }

    let comment_added = payload
        .comment
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());

    let score = state
        .repo
        .update_score(ScorePatch {
            id: payload.id,
            title: payload.title,
            url: payload.url,
            comment: payload.comment,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("score not found".to_string()))?;

    tracing::info!(
        score_id = %score.id,
        updated_by = %user_id,
        comment_added,
        "score updated"
    );
    Ok(Json(DataResponse::new(score)).into_response())
}
