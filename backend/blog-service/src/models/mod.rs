/// Data models for blog-service
///
/// This module defines structures for:
/// - Identity: an author as supplied by the identity provider
/// - Post: a text entry, optionally filed under a group, optionally with an image
/// - Group: a topic board posts can be filed under
/// - Comment: a reply on a post (owned by the post)
///
/// Follow edges have no struct of their own; `FollowRepository` takes the
/// `(user_id, author_id)` pair directly.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters shown when a post or comment is displayed inline.
pub const DISPLAY_PREFIX_CHARS: usize = 15;

fn display_prefix(text: &str) -> String {
    text.chars().take(DISPLAY_PREFIX_CHARS).collect()
}

/// An authenticated user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A post joined with its author's username and its group's slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
}

impl Post {
    pub fn is_authored_by(&self, identity: &Identity) -> bool {
        self.author_id == identity.id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_prefix(&self.text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_prefix(&self.text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Fields an author may change on an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}
