use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{FollowRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::metrics::feed::FOLLOW_MUTATIONS_TOTAL;
use crate::models::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

impl FollowOutcome {
    fn as_label(self) -> &'static str {
        match self {
            FollowOutcome::Created => "created",
            FollowOutcome::AlreadyFollowing => "already_following",
            FollowOutcome::SelfFollow => "self",
        }
    }
}

/// Directed follow edges between identities.
///
/// Both mutations are idempotent. Uniqueness of an edge is enforced by the
/// store, so two concurrent `follow` calls for the same pair leave one edge.
#[derive(Clone)]
pub struct FollowLedger {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

impl FollowLedger {
    pub fn new(follows: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { follows, users }
    }

    async fn resolve(&self, username: &str) -> Result<Identity> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))
    }

    /// Follow the author named `username`.
    pub async fn follow(&self, reader: &Identity, username: &str) -> Result<FollowOutcome> {
        let author = self.resolve(username).await?;

        let outcome = if reader.id == author.id {
            FollowOutcome::SelfFollow
        } else if self.follows.insert_edge(reader.id, author.id).await? {
            FollowOutcome::Created
        } else {
            FollowOutcome::AlreadyFollowing
        };

        FOLLOW_MUTATIONS_TOTAL
            .with_label_values(&["follow", outcome.as_label()])
            .inc();
        match outcome {
            FollowOutcome::Created => {
                info!(user_id = reader.id, author_id = author.id, "follow edge created")
            }
            _ => debug!(
                user_id = reader.id,
                author_id = author.id,
                outcome = outcome.as_label(),
                "follow was a no-op"
            ),
        }
        Ok(outcome)
    }

    /// Stop following `username`; returns whether an edge was removed.
    pub async fn unfollow(&self, reader: &Identity, username: &str) -> Result<bool> {
        let author = self.resolve(username).await?;
        let removed = self.follows.delete_edge(reader.id, author.id).await?;

        FOLLOW_MUTATIONS_TOTAL
            .with_label_values(&["unfollow", if removed { "removed" } else { "absent" }])
            .inc();
        if removed {
            info!(user_id = reader.id, author_id = author.id, "follow edge removed");
        }
        Ok(removed)
    }

    /// False for an anonymous viewer.
    pub async fn is_following(&self, viewer: Option<&Identity>, author: &Identity) -> Result<bool> {
        match viewer {
            None => Ok(false),
            Some(viewer) => self.follows.edge_exists(viewer.id, author.id).await,
        }
    }
}
