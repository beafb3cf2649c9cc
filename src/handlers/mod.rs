//! Route handlers, one module per resource. Handlers run strictly after the
//! Authorization Gate: identity arrives pre-validated via the `AuthUser`
//! extractor and no handler re-checks roles. Each handler validates input,
//! calls the repository, and shapes the JSON envelope.

pub mod attendance;
pub mod auth;
pub mod concerts;
pub mod contact;
pub mod practices;
pub mod scores;

pub use attendance::*;
pub use auth::*;
pub use concerts::*;
pub use contact::*;
pub use practices::*;
pub use scores::*;

/// Shared query shape for the DELETE endpoints: `?id=` names the record.
/// `id` is optional at the type level so a missing parameter surfaces as a
/// 400 naming the field instead of a generic deserialization rejection.
#[derive(serde::Deserialize, utoipa::IntoParams)]
pub struct DeleteQuery {
    pub id: Option<uuid::Uuid>,
}
