use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{CommentRepository, GroupRepository, PostFilter, PostRepository};
use crate::error::{AppError, Result};
use crate::forms::{
    CleanPost, CommentForm, FormErrors, FormOutcome, PostForm, INVALID_CHOICE_MESSAGE,
};
use crate::middleware::can_edit;
use crate::models::{Comment, Identity, NewComment, NewPost, Post, PostChanges};

/// Detail page context.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    /// Number of posts by the post's author.
    pub count: u64,
    pub comments: Vec<Comment>,
    pub form: CommentForm,
    pub can_edit: bool,
}

/// Post and comment mutations, plus the single-post read.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
        }
    }

    pub async fn get(&self, post_id: i64) -> Result<Post> {
        self.posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    pub async fn detail(&self, post_id: i64, viewer: Option<&Identity>) -> Result<PostDetail> {
        let post = self.get(post_id).await?;
        let count = self
            .posts
            .count_posts(PostFilter::Author(post.author_id))
            .await?;
        let comments = self.comments.list_for_post(post.id).await?;
        let can_edit = can_edit(viewer, &post);

        Ok(PostDetail {
            post,
            count,
            comments,
            form: CommentForm::default(),
            can_edit,
        })
    }

    /// Field validation plus the group lookup.
    async fn clean(&self, form: &PostForm) -> Result<std::result::Result<CleanPost, FormErrors>> {
        let clean = match form.clean() {
            Ok(clean) => clean,
            Err(errors) => return Ok(Err(errors)),
        };

        if let Some(group_id) = clean.group_id {
            if self.groups.find_by_id(group_id).await?.is_none() {
                let mut errors = FormErrors::new();
                errors.add("group", INVALID_CHOICE_MESSAGE);
                return Ok(Err(errors));
            }
        }
        Ok(Ok(clean))
    }

    pub async fn create(&self, author: &Identity, form: &PostForm) -> Result<FormOutcome<Post>> {
        let clean = match self.clean(form).await? {
            Ok(clean) => clean,
            Err(errors) => {
                debug!(user_id = author.id, ?errors, "post form rejected");
                return Ok(FormOutcome::Invalid(errors));
            }
        };

        let post = self
            .posts
            .create_post(NewPost {
                author_id: author.id,
                text: clean.text,
                group_id: clean.group_id,
                image: clean.image,
            })
            .await?;

        info!(post_id = post.id, user_id = author.id, "post created");
        Ok(FormOutcome::Saved(post))
    }

    /// Apply an edit. The caller has already checked authorship.
    ///
    /// A submission without an `image` field keeps the stored attachment; an
    /// empty `image` value clears it.
    pub async fn update(&self, post: &Post, form: &PostForm) -> Result<FormOutcome<Post>> {
        let clean = match self.clean(form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };
        let image = match form.image {
            Some(_) => clean.image,
            None => post.image.clone(),
        };

        let updated = self
            .posts
            .update_post(
                post.id,
                PostChanges {
                    text: clean.text,
                    group_id: clean.group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))?;

        info!(post_id = updated.id, "post updated");
        Ok(FormOutcome::Saved(updated))
    }

    pub async fn add_comment(
        &self,
        author: &Identity,
        post_id: i64,
        form: &CommentForm,
    ) -> Result<FormOutcome<Comment>> {
        let post = self.get(post_id).await?;
        let text = match form.clean() {
            Ok(text) => text,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let comment = self
            .comments
            .create_comment(NewComment {
                post_id: post.id,
                author_id: author.id,
                text,
            })
            .await?;

        info!(comment_id = comment.id, post_id = post.id, user_id = author.id, "comment added");
        Ok(FormOutcome::Saved(comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::forms::REQUIRED_MESSAGE;

    async fn service() -> (PostService, Arc<MemoryStore>, Identity) {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_user("auth").await;
        (
            PostService::new(store.clone(), store.clone(), store.clone()),
            store,
            author,
        )
    }

    fn post_form(text: &str, group: Option<String>) -> PostForm {
        PostForm {
            text: text.to_string(),
            group,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_stores_post_with_group() {
        let (service, store, author) = service().await;
        let group = store.add_group("cats", "Cats", "").await;

        let outcome = service
            .create(&author, &post_form("Тестовый текст", Some(group.id.to_string())))
            .await
            .unwrap();
        let FormOutcome::Saved(post) = outcome else {
            panic!("form should be valid");
        };
        assert_eq!(post.author, "auth");
        assert_eq!(post.group_slug.as_deref(), Some("cats"));
        assert_eq!(store.post_count().await, 1);
    }

    #[tokio::test]
    async fn blank_text_persists_nothing() {
        let (service, store, author) = service().await;
        let outcome = service.create(&author, &post_form("  ", None)).await.unwrap();
        let FormOutcome::Invalid(errors) = outcome else {
            panic!("form should be invalid");
        };
        assert_eq!(errors.field("text"), [REQUIRED_MESSAGE.to_string()]);
        assert_eq!(store.post_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_group_is_invalid_choice() {
        let (service, store, author) = service().await;
        let outcome = service
            .create(&author, &post_form("text", Some("999".into())))
            .await
            .unwrap();
        assert!(matches!(outcome, FormOutcome::Invalid(e) if !e.field("group").is_empty()));
        assert_eq!(store.post_count().await, 0);
    }

    #[tokio::test]
    async fn update_changes_text_and_clears_group() {
        let (service, store, author) = service().await;
        let group = store.add_group("cats", "Cats", "").await;
        let FormOutcome::Saved(post) = service
            .create(&author, &post_form("before", Some(group.id.to_string())))
            .await
            .unwrap()
        else {
            panic!("form should be valid");
        };

        let FormOutcome::Saved(updated) =
            service.update(&post, &post_form("after", None)).await.unwrap()
        else {
            panic!("form should be valid");
        };
        assert_eq!(updated.text, "after");
        assert_eq!(updated.group_id, None);
        assert_eq!(updated.created_at, post.created_at);
    }

    #[tokio::test]
    async fn update_without_image_keeps_attachment() {
        let (service, _store, author) = service().await;
        let form = PostForm {
            image: Some("posts/small.gif".into()),
            ..post_form("before", None)
        };
        let FormOutcome::Saved(post) = service.create(&author, &form).await.unwrap() else {
            panic!("form should be valid");
        };

        let FormOutcome::Saved(kept) =
            service.update(&post, &post_form("after", None)).await.unwrap()
        else {
            panic!("form should be valid");
        };
        assert_eq!(kept.image.as_deref(), Some("posts/small.gif"));

        let cleared = PostForm {
            image: Some(String::new()),
            ..post_form("after", None)
        };
        let FormOutcome::Saved(cleared) = service.update(&kept, &cleared).await.unwrap() else {
            panic!("form should be valid");
        };
        assert_eq!(cleared.image, None);
    }

    #[tokio::test]
    async fn detail_lists_comments_oldest_first() {
        let (service, _store, author) = service().await;
        let FormOutcome::Saved(post) = service
            .create(&author, &post_form("post", None))
            .await
            .unwrap()
        else {
            panic!("form should be valid");
        };

        for text in ["first", "second"] {
            service
                .add_comment(&author, post.id, &CommentForm { text: text.into() })
                .await
                .unwrap();
        }

        let detail = service.detail(post.id, Some(&author)).await.unwrap();
        let texts: Vec<&str> = detail.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(detail.count, 1);
        assert!(detail.can_edit);
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let (service, _store, author) = service().await;
        let err = service
            .add_comment(&author, 404, &CommentForm { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
