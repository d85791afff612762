use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;
use crate::error::Result;
use crate::models::Identity;

/// Local mirror of the identity provider's user directory
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let user = sqlx::query_as::<_, Identity>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
