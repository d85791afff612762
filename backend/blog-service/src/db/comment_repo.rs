use async_trait::async_trait;
use sqlx::PgPool;

use super::CommentRepository;
use crate::error::Result;
use crate::models::{Comment, NewComment};

/// Repository for Comment operations
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author, c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT i.id, i.post_id, i.author_id, u.username AS author, i.text, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(new_comment.post_id)
        .bind(new_comment.author_id)
        .bind(&new_comment.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }
}
