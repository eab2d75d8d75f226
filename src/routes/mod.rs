/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum
/// layers and the AuthUser extractor), with the Permission Evaluator doing
/// the fine-grained role/ownership work inside handlers.

/// Routes accessible to all clients: signup, token exchange and every
/// read-only catalog/feedback endpoint.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware: self profile
/// and feedback writes.
pub mod authenticated;

/// Routes whose write policy is admin-gated: catalog mutation and the
/// /users directory. Handlers resolve AuthUser themselves and run the
/// strict evaluator policies.
pub mod admin;
