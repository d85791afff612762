use async_trait::async_trait;
use sqlx::PgPool;

use super::GroupRepository;
use crate::error::Result;
use crate::models::Group;

/// Repository for Group lookups. Groups are managed by administrators.
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, slug, title, description
            FROM groups
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, slug, title, description
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }
}
