use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{DataResponse, UpdateContactRequest},
    validate,
};

/// get_contact_info
///
/// [Session Route] Returns the contact record. The record is singleton-like:
/// whatever row was updated most recently is the one everyone sees.
#[utoipa::path(
    get,
    path = "/contact",
    responses(
        (status = 200, description = "Contact info"),
        (status = 404, description = "No contact info recorded")
    )
)]
pub async fn get_contact_info(State(state): State<AppState>) -> Result<Response, ApiError> {
    let info = state
        .repo
        .get_contact_info()
        .await?
        .ok_or_else(|| ApiError::NotFound("contact info not found".to_string()))?;
    Ok(Json(DataResponse::new(info)).into_response())
}

/// update_contact_info
///
/// [Admin Route] Replaces the contact record's fields. Both fields are required
/// and the email must be well-formed; first write creates the record.
#[utoipa::path(
    put,
    path = "/contact",
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn update_contact_info(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<Response, ApiError> {
    validate::required("email", &payload.email)?;
    validate::required("description", &payload.description)?;
    validate::email(&payload.email)?;

    let info = state
        .repo
        .update_contact_info(payload.email, payload.description)
        .await?;

    tracing::info!(updated_by = %user_id, "contact info updated");
    Ok(Json(DataResponse::new(info)).into_response())
}
