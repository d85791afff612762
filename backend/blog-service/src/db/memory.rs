//! In-process store implementing every repository trait.
//!
//! Backs the integration tests and local runs without PostgreSQL. It keeps the
//! same invariants the schema enforces: one edge per (follower, author) pair,
//! no self-follow, and comments removed together with their post.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use super::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
    UserRepository,
};
use crate::error::{AppError, Result};
use crate::models::{Comment, Group, Identity, NewComment, NewPost, Post, PostChanges};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, Identity>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: HashSet<(i64, i64)>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, user_id: i64) -> Result<String> {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| AppError::Internal(format!("unknown user id {}", user_id)))
    }

    fn group_slug(&self, group_id: Option<i64>) -> Result<Option<String>> {
        match group_id {
            None => Ok(None),
            Some(id) => self
                .groups
                .get(&id)
                .map(|g| Some(g.slug.clone()))
                .ok_or_else(|| AppError::Internal(format!("unknown group id {}", id))),
        }
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&(user_id, post.author_id)),
        }
    }

    fn insert_post(&mut self, new_post: NewPost) -> Result<Post> {
        let author = self.username(new_post.author_id)?;
        let group_slug = self.group_slug(new_post.group_id)?;
        let post = Post {
            id: self.next_id(),
            text: new_post.text,
            created_at: Utc::now(),
            author_id: new_post.author_id,
            author,
            group_id: new_post.group_id,
            group_slug,
            image: new_post.image,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user in the directory (the identity provider's job in production).
    pub async fn add_user(&self, username: &str) -> Identity {
        let mut inner = self.inner.write().await;
        let identity = Identity {
            id: inner.next_id(),
            username: username.to_string(),
        };
        inner.users.insert(identity.id, identity.clone());
        identity
    }

    pub async fn add_group(&self, slug: &str, title: &str, description: &str) -> Group {
        let mut inner = self.inner.write().await;
        let group = Group {
            id: inner.next_id(),
            slug: slug.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        };
        inner.groups.insert(group.id, group.clone());
        group
    }

    pub async fn post_count(&self) -> usize {
        self.inner.read().await.posts.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.inner.read().await.comments.len()
    }

    pub async fn follow_count(&self) -> usize {
        self.inner.read().await.follows.len()
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.posts.values().filter(|p| inner.matches(p, filter)).count() as u64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| inner.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&post_id).cloned())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        self.inner.write().await.insert_post(new_post)
    }

    async fn bulk_create(&self, posts: Vec<NewPost>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut inserted = 0;
        for new_post in posts {
            inner.insert_post(new_post)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut inner = self.inner.write().await;
        let group_slug = inner.group_slug(changes.group_id)?;
        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        post.group_slug = group_slug;
        post.image = changes.image;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.posts.remove(&post_id).is_some();
        if removed {
            inner.comments.retain(|_, c| c.post_id != post_id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let inner = self.inner.read().await;
        Ok(inner.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.inner.read().await.groups.get(&group_id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&new_comment.post_id) {
            return Err(AppError::NotFound(format!("post {}", new_comment.post_id)));
        }
        let author = inner.username(new_comment.author_id)?;
        let comment = Comment {
            id: inner.next_id(),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            author,
            text: new_comment.text,
            created_at: Utc::now(),
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn edge_exists(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self.inner.read().await.follows.contains(&(user_id, author_id)))
    }

    async fn insert_edge(&self, user_id: i64, author_id: i64) -> Result<bool> {
        if user_id == author_id {
            return Ok(false);
        }
        Ok(self.inner.write().await.follows.insert((user_id, author_id)))
    }

    async fn delete_edge(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self.inner.write().await.follows.remove(&(user_id, author_id)))
    }
}
