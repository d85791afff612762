use async_trait::async_trait;
use sqlx::PgPool;

use super::FollowRepository;
use crate::error::Result;

/// Follow edges. `UNIQUE (user_id, author_id)` makes concurrent inserts of the
/// same pair collapse into a single row.
#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn edge_exists(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_edge(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete_edge(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }
}
