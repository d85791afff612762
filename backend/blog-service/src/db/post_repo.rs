use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{PostFilter, PostRepository};
use crate::error::Result;
use crate::models::{NewPost, Post, PostChanges};

const POST_SELECT: &str = r#"
    SELECT p.id, p.text, p.created_at, p.author_id, u.username AS author,
           p.group_id, g.slug AS group_slug, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

/// Repository for Post operations
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        qb.push(" WHERE p.id = ").push_bind(post_id);
        let post = qb.build_query_as::<Post>().fetch_optional(&self.pool).await?;
        Ok(post)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        self.fetch_by_id(post_id).await
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let post_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (author_id, text, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new_post.author_id)
        .bind(&new_post.text)
        .bind(new_post.group_id)
        .bind(&new_post.image)
        .fetch_one(&self.pool)
        .await?;

        self.fetch_by_id(post_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
            .map_err(Into::into)
    }

    async fn bulk_create(&self, posts: Vec<NewPost>) -> Result<u64> {
        if posts.is_empty() {
            return Ok(0);
        }

        let mut qb =
            QueryBuilder::<Postgres>::new("INSERT INTO posts (author_id, text, group_id, image) ");
        qb.push_values(posts, |mut row, post| {
            row.push_bind(post.author_id)
                .push_bind(post.text)
                .push_bind(post.group_id)
                .push_bind(post.image);
        });

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_by_id(post_id).await
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
