//! Request handlers, grouped by resource family.
//!
//! Every handler follows the same shape: extract the authenticated identity
//! where writes are involved, run the Permission Evaluator, validate the
//! payload, then delegate to the Repository and serialize the outcome.

pub mod auth;
pub mod catalog;
pub mod feedback;
pub mod users;

use serde::Deserialize;

/// SearchFilter
///
/// Shared `?search=` query parameter used by the category, genre and user
/// listing endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchFilter {
    /// Optional case-insensitive substring match on the name field.
    pub search: Option<String>,
}
