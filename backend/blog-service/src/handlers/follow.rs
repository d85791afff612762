use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::Result;
use crate::middleware::{require_identity, Actor};
use crate::presentation;
use crate::state::AppState;

const FOLLOW_INDEX: &str = "/follow/";

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let reader = require_identity(&actor, &req, &state.login_url)?;
    state.follows.follow(reader, &username).await?;
    Ok(presentation::redirect(FOLLOW_INDEX))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let reader = require_identity(&actor, &req, &state.login_url)?;
    state.follows.unfollow(reader, &username).await?;
    Ok(presentation::redirect(FOLLOW_INDEX))
}
