/// Authorship guard
///
/// Explicit checks called at the start of each mutation handler. They return a
/// typed outcome; the handler decides how the presentation boundary reacts.
use actix_web::HttpRequest;
use tracing::debug;

use super::identity::Actor;
use crate::error::AppError;
use crate::metrics::feed::EDIT_GUARD_DENIALS_TOTAL;
use crate::models::{Identity, Post};
use crate::presentation;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    Granted(&'a Identity),
    AuthRequired,
    Forbidden,
}

/// True iff the viewer is authenticated and wrote the post.
pub fn can_edit(viewer: Option<&Identity>, post: &Post) -> bool {
    viewer.is_some_and(|identity| post.is_authored_by(identity))
}

/// Check whether `actor` may change `post`.
pub fn check_post_edit<'a>(actor: &'a Actor, post: &Post) -> Access<'a> {
    match actor.identity() {
        None => Access::AuthRequired,
        Some(identity) if post.is_authored_by(identity) => Access::Granted(identity),
        Some(identity) => {
            EDIT_GUARD_DENIALS_TOTAL.inc();
            debug!(
                post_id = post.id,
                user_id = identity.id,
                "edit denied: not the author"
            );
            Access::Forbidden
        }
    }
}

/// Require an authenticated actor, otherwise fail with a redirect to the login
/// page that returns to the current path.
pub fn require_identity<'a>(
    actor: &'a Actor,
    req: &HttpRequest,
    login_url: &str,
) -> Result<&'a Identity, AppError> {
    actor
        .identity()
        .ok_or_else(|| authentication_required(req, login_url))
}

pub fn authentication_required(req: &HttpRequest, login_url: &str) -> AppError {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());
    AppError::AuthenticationRequired {
        location: presentation::login_location(login_url, next),
    }
}
