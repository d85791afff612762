/// HTTP request handlers
///
/// Handlers resolve the actor, call the guards explicitly, delegate to a
/// service and hand the result to the presentation boundary.
pub mod feed;
pub mod follow;
pub mod posts;

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::pagination::{PageNumber, PageQuery};
use crate::presentation::{self, View};

/// Page cursor from the query string; malformed queries fall back to page 1.
pub(crate) fn page_number(req: &HttpRequest) -> PageNumber {
    web::Query::<PageQuery>::from_query(req.query_string())
        .map(|q| q.number())
        .unwrap_or_default()
}

/// Fallback for every unmatched path.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    presentation::render_with_status(
        View::NotFound,
        StatusCode::NOT_FOUND,
        serde_json::json!({ "path": req.path() }),
    )
}

/// Route table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|_, req| AppError::NotFound(req.path().to_string()).into()),
    )
    .route("/", web::get().to(feed::index))
    .route("/group/{slug}/", web::get().to(feed::group_posts))
    .route("/follow/", web::get().to(feed::follow_index))
    .route("/profile/{username}/", web::get().to(feed::profile))
    .route(
        "/profile/{username}/follow/",
        web::get().to(follow::profile_follow),
    )
    .route(
        "/profile/{username}/unfollow/",
        web::get().to(follow::profile_unfollow),
    )
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::create_form))
            .route(web::post().to(posts::create_post)),
    )
    .route("/posts/{post_id}/", web::get().to(posts::post_detail))
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::edit_form))
            .route(web::post().to(posts::edit_post)),
    )
    .service(
        web::resource("/posts/{post_id}/comment/")
            .route(web::get().to(posts::add_comment))
            .route(web::post().to(posts::add_comment)),
    );
}
