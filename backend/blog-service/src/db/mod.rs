/// Database access layer
///
/// Each aggregate is reached through a repository trait so feed composition and
/// the mutation rules can run against PostgreSQL in production and against
/// `MemoryStore` in tests.
pub mod comment_repo;
pub mod follow_repo;
pub mod group_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{Comment, Group, Identity, NewComment, NewPost, Post, PostChanges};

pub use comment_repo::PgCommentRepository;
pub use follow_repo::PgFollowRepository;
pub use group_repo::PgGroupRepository;
pub use memory::MemoryStore;
pub use post_repo::PgPostRepository;
pub use user_repo::PgUserRepository;

/// Candidate-set filter for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author `user_id` follows.
    FollowedBy(i64),
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Number of posts matching `filter`.
    async fn count_posts(&self, filter: PostFilter) -> Result<u64>;

    /// Matching posts, newest first (ties broken by id, newest first).
    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>>;

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>>;

    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    /// Insert many posts in one round-trip; returns the number inserted.
    async fn bulk_create(&self, posts: Vec<NewPost>) -> Result<u64>;

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// Hard delete, cascading to comments. Only used by administrative tooling.
    async fn delete_post(&self, post_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    async fn find_by_id(&self, group_id: i64) -> Result<Option<Group>>;
}

/// Read-only view of the identity provider's user directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn edge_exists(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Idempotent insert; returns true if a new edge was stored.
    async fn insert_edge(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Idempotent delete; returns true if an edge was removed.
    async fn delete_edge(&self, user_id: i64, author_id: i64) -> Result<bool>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub users: Arc<dyn UserRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            follows: Arc::new(PgFollowRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            posts: store.clone(),
            groups: store.clone(),
            users: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }
}

/// Create the PostgreSQL pool and, if configured, apply embedded migrations.
pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    Ok(pool)
}
