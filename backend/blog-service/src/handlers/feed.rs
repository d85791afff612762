use actix_web::{web, HttpRequest, HttpResponse};

use super::page_number;
use crate::error::Result;
use crate::middleware::{require_identity, Actor};
use crate::presentation::{self, View};
use crate::state::AppState;

/// GET / - global feed, served through the page cache
pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let body = state
        .feeds
        .rendered_global_feed(req.query_string(), page_number(&req))
        .await?;
    Ok(presentation::from_body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    req: HttpRequest,
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let feed = state.feeds.group_feed(&slug, page_number(&req)).await?;
    presentation::render(View::GroupList, &feed)
}

/// GET /profile/{username}/
pub async fn profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let feed = state
        .feeds
        .profile_feed(actor.identity(), &username, page_number(&req))
        .await?;
    presentation::render(View::Profile, &feed)
}

/// GET /follow/ - posts by followed authors
pub async fn follow_index(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
) -> Result<HttpResponse> {
    let reader = require_identity(&actor, &req, &state.login_url)?;
    let feed = state.feeds.followed_feed(reader, page_number(&req)).await?;
    presentation::render(View::Follow, &feed)
}
