use std::sync::Arc;

use crate::cache::PageCacheService;
use crate::db::Repositories;
use crate::services::{FeedComposer, FollowLedger, PostService};

/// Shared state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<FeedComposer>,
    pub follows: Arc<FollowLedger>,
    pub posts: Arc<PostService>,
    /// Where anonymous actors are sent to sign in.
    pub login_url: Arc<str>,
}

impl AppState {
    pub fn new(repos: Repositories, cache: PageCacheService, login_url: &str) -> Self {
        let follows = FollowLedger::new(repos.follows.clone(), repos.users.clone());
        let feeds = FeedComposer::new(
            repos.posts.clone(),
            repos.groups.clone(),
            repos.users.clone(),
            follows.clone(),
            cache,
        );
        let posts = PostService::new(repos.posts, repos.groups, repos.comments);

        Self {
            feeds: Arc::new(feeds),
            follows: Arc::new(follows),
            posts: Arc::new(posts),
            login_url: Arc::from(login_url),
        }
    }
}
