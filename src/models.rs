use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// Concert
///
/// The root scheduling aggregate: a single performance event. Owns attendance
/// forms, scores, and practices. Concerts are never physically removed; a
/// "delete" flips `is_active` to false and leaves every child row in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Concert {
    pub id: Uuid,
    pub title: String,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub venue: String,
    /// Logical-delete flag. Inactive concerts are excluded from active listings
    /// but remain fetchable by id.
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AttendanceForm
///
/// A link to an external attendance-coordination form, owned by exactly one concert.
/// Fully CRUD-able; deletion is physical.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AttendanceForm {
    pub id: Uuid,
    // FK to concerts.id.
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Score
///
/// A link to sheet music hosted externally, owned by exactly one concert.
/// Each score carries an append-only comment history (see `ScoreComment`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Score {
    pub id: Uuid,
    // FK to concerts.id.
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
    pub is_valid: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ScoreComment
///
/// An immutable entry in a score's change history. Create-only: there is no
/// update or delete operation, and entries display newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScoreComment {
    pub id: Uuid,
    // FK to scores.id.
    pub score_id: Uuid,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ScoreWithComments
///
/// A score together with its full comment history, assembled by the repository
/// for the concert detail and score listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScoreWithComments {
    #[serde(flatten)]
    #[ts(flatten)]
    pub score: Score,
    /// Ordered newest-first.
    pub comments: Vec<ScoreComment>,
}

/// Practice
///
/// A rehearsal entry owned by exactly one concert. `end_time`, when present,
/// is strictly after `start_time`; the handlers validate this before any write.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Practice {
    pub id: Uuid,
    // FK to concerts.id.
    pub concert_id: Uuid,
    pub title: String,
    #[ts(type = "string")]
    pub start_time: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub end_time: Option<DateTime<Utc>>,
    pub venue: String,
    pub address: Option<String>,
    /// What to bring.
    pub items: Option<String>,
    pub notes: Option<String>,
    pub memo: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ContactInfo
///
/// Singleton-like contact record: reads consult the most recently updated row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactInfo {
    pub id: Uuid,
    pub email: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ConcertDetail
///
/// A concert with all of its children, shaped for the detail endpoint:
/// attendance forms newest-first, scores newest-updated-first (each carrying
/// comments newest-first), practices earliest-start-first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConcertDetail {
    pub concert: Concert,
    pub attendance_forms: Vec<AttendanceForm>,
    pub scores: Vec<ScoreWithComments>,
    pub practices: Vec<Practice>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /login. The role arrives as a raw string and is
/// parsed into the closed `Role` enum by the handler so that an unknown role
/// surfaces as a 400 with a useful message rather than a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub password: String,
    pub role: String,
}

/// SessionUser
///
/// The identity block returned by the login and verify endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub user_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// CreateConcertRequest
///
/// Input payload for POST /concerts. The date arrives as an RFC 3339 string and
/// is parsed by the handler so unparsable input maps to a 400 validation error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateConcertRequest {
    pub title: String,
    pub date: String,
    pub venue: String,
}

/// UpdateConcertRequest
///
/// Merge-patch payload for PUT /concerts: only supplied fields are written,
/// everything else retains its prior value. Setting `is_active=true` is the
/// one-way-back transition that reactivates a soft-deleted concert.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateConcertRequest {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateAttendanceFormRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateAttendanceFormRequest {
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// UpdateAttendanceFormRequest
///
/// Merge-patch payload for PUT /attendance.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAttendanceFormRequest {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreateScoreRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateScoreRequest {
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
}

/// UpdateScoreRequest
///
/// Merge-patch payload for PUT /scores. A non-empty `comment` string makes the
/// update atomically append one entry to the score's comment history.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateScoreRequest {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// CreatePracticeRequest
///
/// Times arrive as RFC 3339 strings; the handler parses them and rejects
/// `end_time <= start_time` before anything reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePracticeRequest {
    pub concert_id: Uuid,
    pub title: String,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// UpdatePracticeRequest
///
/// Merge-patch payload for PUT /practices. The end-after-start invariant is
/// re-checked against the merged record, so moving only one of the two times
/// can never produce an inverted interval.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdatePracticeRequest {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// UpdateContactRequest
///
/// Input payload for PUT /contact. Both fields are required; the email must
/// pass the well-formedness check before any write happens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateContactRequest {
    pub email: String,
    pub description: String,
}

// --- Response Envelopes ---

/// MessageResponse
///
/// The `{success, message}` envelope used by mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// DataResponse
///
/// The `{success, data}` envelope used by read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// LoginResponse
///
/// Returned by POST /login alongside the Set-Cookie header carrying the token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

/// VerifyResponse
///
/// Returned by GET /verify for client-side session introspection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VerifyResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}
