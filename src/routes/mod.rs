/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules.
/// The Authorization Gate (`auth::auth_gate`) is layered over the merged
/// router in `create_router` and is the single place role rules are applied;
/// these modules only wire paths to handlers.

/// Routes the gate classifies as public (login, introspection, health, docs).
pub mod public;

/// Read endpoints and logout: any valid session passes the gate.
pub mod authenticated;

/// Mutation endpoints: the gate requires the admin role for these
/// (path, method) pairs.
pub mod admin;
