use actix_web::{http::header, web, Either, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::forms::{CommentForm, FormErrors, FormOutcome, PostForm};
use crate::middleware::permissions::authentication_required;
use crate::middleware::{check_post_edit, require_identity, Access, Actor};
use crate::models::Post;
use crate::presentation::{self, View};
use crate::state::AppState;

/// Form body accepted as JSON or urlencoded.
type Submission<T> = std::result::Result<Either<web::Json<T>, web::Form<T>>, actix_web::Error>;

fn has_body(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}

/// Post form body. A missing body is an empty submission; a body that cannot
/// be read as JSON or urlencoded is rejected.
fn submitted<T: Default>(req: &HttpRequest, payload: Submission<T>) -> Result<T> {
    match payload {
        Ok(Either::Left(json)) => Ok(json.into_inner()),
        Ok(Either::Right(form)) => Ok(form.into_inner()),
        Err(e) if has_body(req) => {
            debug!(path = req.path(), error = %e, "unreadable post form body");
            Err(AppError::BadRequest("unreadable form body".to_string()))
        }
        Err(_) => Ok(T::default()),
    }
}

/// Comment form body; anything unreadable counts as an empty submission.
fn submitted_or_empty<T: Default>(req: &HttpRequest, payload: Submission<T>) -> T {
    match payload {
        Ok(Either::Left(json)) => json.into_inner(),
        Ok(Either::Right(form)) => form.into_inner(),
        Err(e) => {
            debug!(path = req.path(), error = %e, "unreadable comment body, treating as empty");
            T::default()
        }
    }
}

fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Create/edit page context.
#[derive(Serialize)]
struct PostFormPage<'a> {
    form: &'a PostForm,
    errors: &'a FormErrors,
    is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<&'a Post>,
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    actor: Actor,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let detail = state.posts.detail(*post_id, actor.identity()).await?;
    presentation::render(View::PostDetail, &detail)
}

/// GET /create/
pub async fn create_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
) -> Result<HttpResponse> {
    require_identity(&actor, &req, &state.login_url)?;
    presentation::render(
        View::CreatePost,
        &PostFormPage {
            form: &PostForm::default(),
            errors: &FormErrors::new(),
            is_edit: false,
            post: None,
        },
    )
}

/// POST /create/
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    payload: Submission<PostForm>,
) -> Result<HttpResponse> {
    let author = require_identity(&actor, &req, &state.login_url)?;
    let form = submitted(&req, payload)?;

    match state.posts.create(author, &form).await? {
        FormOutcome::Saved(_) => Ok(presentation::redirect(&format!(
            "/profile/{}/",
            author.username
        ))),
        FormOutcome::Invalid(errors) => presentation::render(
            View::CreatePost,
            &PostFormPage {
                form: &form,
                errors: &errors,
                is_edit: false,
                post: None,
            },
        ),
    }
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    require_identity(&actor, &req, &state.login_url)?;
    let post = state.posts.get(*post_id).await?;

    match check_post_edit(&actor, &post) {
        Access::AuthRequired => Err(authentication_required(&req, &state.login_url)),
        Access::Forbidden => Ok(presentation::redirect(&post_url(post.id))),
        Access::Granted(_) => presentation::render(
            View::CreatePost,
            &PostFormPage {
                form: &PostForm::from_post(&post),
                errors: &FormErrors::new(),
                is_edit: true,
                post: Some(&post),
            },
        ),
    }
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    post_id: web::Path<i64>,
    payload: Submission<PostForm>,
) -> Result<HttpResponse> {
    require_identity(&actor, &req, &state.login_url)?;
    let post = state.posts.get(*post_id).await?;

    match check_post_edit(&actor, &post) {
        Access::AuthRequired => return Err(authentication_required(&req, &state.login_url)),
        Access::Forbidden => return Ok(presentation::redirect(&post_url(post.id))),
        Access::Granted(_) => {}
    }

    let form = submitted(&req, payload)?;
    match state.posts.update(&post, &form).await? {
        FormOutcome::Saved(updated) => Ok(presentation::redirect(&post_url(updated.id))),
        FormOutcome::Invalid(errors) => presentation::render(
            View::CreatePost,
            &PostFormPage {
                form: &form,
                errors: &errors,
                is_edit: true,
                post: Some(&post),
            },
        ),
    }
}

/// GET|POST /posts/{post_id}/comment/ - always lands back on the post
pub async fn add_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: Actor,
    post_id: web::Path<i64>,
    payload: Submission<CommentForm>,
) -> Result<HttpResponse> {
    let author = require_identity(&actor, &req, &state.login_url)?;
    let post_id = post_id.into_inner();

    state
        .posts
        .add_comment(author, post_id, &submitted_or_empty(&req, payload))
        .await?;
    Ok(presentation::redirect(&post_url(post_id)))
}
