//! Permission Evaluator.
//!
//! Pure, stateless predicates mapping (HTTP method, authenticated actor,
//! resource ownership) to allow/deny. Evaluated once per request, in two
//! phases: collection-level [`Policy::has_permission`] before a handler
//! touches the store, and object-level [`Policy::has_object_permission`]
//! once the target resource (and thus ownership) is known.
//!
//! Policies are built from small composable predicates combined with plain
//! boolean logic instead of an inheritance hierarchy, and roles are the
//! closed [`UserRole`] enum rather than strings.

use axum::http::Method;

use crate::{auth::AuthUser, error::ApiError};

/// Read access: GET, HEAD and OPTIONS never mutate anything.
pub fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn is_admin(actor: Option<&AuthUser>) -> bool {
    actor.is_some_and(|u| u.role.is_admin())
}

fn is_admin_or_superuser(actor: Option<&AuthUser>) -> bool {
    actor.is_some_and(|u| u.role.is_admin() || u.is_superuser)
}

fn can_moderate(actor: Option<&AuthUser>) -> bool {
    actor.is_some_and(|u| u.role.can_moderate())
}

fn is_authenticated(actor: Option<&AuthUser>) -> bool {
    actor.is_some()
}

/// Policy
///
/// The four access rules used across the API surface. Each maps a resource
/// family onto the evaluator predicates below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Write allowed only for the resource's author; everyone may read.
    AuthorOrReadOnly,
    /// Write allowed for admins, moderators or the author; everyone may read.
    /// Governs reviews and comments.
    AdminModeratorAuthorOrReadOnly,
    /// Write allowed only for the admin role; everyone may read. Governs the
    /// catalog (categories, genres, titles).
    AdminOrReadOnly,
    /// All access, reads included, requires the admin role or the superuser
    /// flag. Governs the /users directory.
    AdminOrSuperuser,
}

impl Policy {
    /// Collection-level phase: may this actor perform `method` against the
    /// resource collection at all?
    pub fn has_permission(self, method: &Method, actor: Option<&AuthUser>) -> bool {
        match self {
            Self::AuthorOrReadOnly | Self::AdminModeratorAuthorOrReadOnly => {
                is_safe(method) || is_authenticated(actor)
            }
            Self::AdminOrReadOnly => is_safe(method) || is_admin_or_superuser(actor),
            Self::AdminOrSuperuser => is_admin_or_superuser(actor),
        }
    }

    /// Object-level phase: may this actor perform `method` against one
    /// concrete resource, given whether they authored it?
    pub fn has_object_permission(
        self,
        method: &Method,
        actor: Option<&AuthUser>,
        is_owner: bool,
    ) -> bool {
        match self {
            Self::AuthorOrReadOnly => is_safe(method) || is_owner,
            Self::AdminModeratorAuthorOrReadOnly => {
                is_safe(method) || can_moderate(actor) || is_owner
            }
            Self::AdminOrReadOnly => is_safe(method) || is_admin_or_superuser(actor),
            Self::AdminOrSuperuser => is_admin_or_superuser(actor),
        }
    }

    /// Collection-phase check for handler use; denial becomes a 403 (or 401
    /// when no credentials were presented at all).
    pub fn check(self, method: &Method, actor: Option<&AuthUser>) -> Result<(), ApiError> {
        if self.has_permission(method, actor) {
            Ok(())
        } else {
            Err(denial(actor))
        }
    }

    /// Object-phase check for handler use.
    pub fn check_object(
        self,
        method: &Method,
        actor: Option<&AuthUser>,
        is_owner: bool,
    ) -> Result<(), ApiError> {
        if self.has_object_permission(method, actor, is_owner) {
            Ok(())
        } else {
            Err(denial(actor))
        }
    }
}

fn denial(actor: Option<&AuthUser>) -> ApiError {
    if actor.is_some() {
        ApiError::forbidden("You do not have permission to perform this action.")
    } else {
        ApiError::unauthorized("Authentication credentials were not provided.")
    }
}

/// Ownership predicate shared by review/comment handlers.
pub fn owns(user: &AuthUser, author_id: uuid::Uuid) -> bool {
    user.id == author_id
}
