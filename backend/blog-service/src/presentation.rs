//! Render/redirect boundary.
//!
//! Templates live outside this service. A rendered view is a JSON document
//! naming the template and carrying its context, which the front end turns
//! into markup.

use actix_web::{http::header, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Index,
    GroupList,
    Profile,
    PostDetail,
    CreatePost,
    Follow,
    NotFound,
    CsrfFailure,
    BadRequest,
    ServerError,
}

impl View {
    pub fn template(self) -> &'static str {
        match self {
            View::Index => "posts/index.html",
            View::GroupList => "posts/group_list.html",
            View::Profile => "posts/profile.html",
            View::PostDetail => "posts/post_detail.html",
            View::CreatePost => "posts/create_post.html",
            View::Follow => "posts/follow.html",
            View::NotFound => "core/404.html",
            View::CsrfFailure => "core/403csrf.html",
            View::BadRequest => "core/400.html",
            View::ServerError => "core/500.html",
        }
    }
}

#[derive(Serialize)]
struct Rendered<'a, C: Serialize> {
    template: &'static str,
    context: &'a C,
}

/// Serialize a view without wrapping it in a response, so it can be cached.
pub fn render_body<C: Serialize>(view: View, context: &C) -> Result<String> {
    let body = serde_json::to_string(&Rendered {
        template: view.template(),
        context,
    })?;
    Ok(body)
}

pub fn render<C: Serialize>(view: View, context: &C) -> Result<HttpResponse> {
    Ok(from_body(render_body(view, context)?))
}

/// Wrap an already rendered body.
pub fn from_body(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(CONTENT_TYPE)
        .body(body)
}

/// Render for error pages. Never fails: a context that cannot be serialized
/// is replaced by an empty one.
pub fn render_with_status(view: View, status: StatusCode, context: Value) -> HttpResponse {
    let body = render_body(view, &context).unwrap_or_else(|_| {
        format!(r#"{{"template":"{}","context":{{}}}}"#, view.template())
    });
    HttpResponse::build(status)
        .content_type(CONTENT_TYPE)
        .body(body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Login location carrying the original path as `next`.
pub fn login_location(login_url: &str, next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{}{}next={}", login_url, separator, encoded)
}
