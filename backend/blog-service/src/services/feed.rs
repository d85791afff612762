/// Feed composition
///
/// The four feeds share one pipeline: count the candidate set, clamp the
/// requested page, fetch that slice newest first. They differ only in the
/// `PostFilter` they pass down.
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::follow::FollowLedger;
use crate::cache::{page_cache_key, PageCacheService};
use crate::db::{GroupRepository, PostFilter, PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::metrics::feed::FEED_REQUEST_TOTAL;
use crate::models::{Group, Identity, Post};
use crate::pagination::{Page, PageNumber, Paginator};
use crate::presentation::{self, View};

/// Group page context.
#[derive(Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page_obj: Page<Post>,
}

/// Profile page context.
#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub author: Identity,
    pub page_obj: Page<Post>,
    /// Total number of posts by the author.
    pub count: u64,
    pub following: bool,
    /// The viewer is looking at their own profile.
    pub itsme: bool,
}

#[derive(Debug, Serialize)]
pub struct PostFeed {
    pub page_obj: Page<Post>,
}

#[derive(Clone)]
pub struct FeedComposer {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: FollowLedger,
    cache: PageCacheService,
}

impl FeedComposer {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: FollowLedger,
        cache: PageCacheService,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            cache,
        }
    }

    pub fn cache(&self) -> &PageCacheService {
        &self.cache
    }

    async fn paginate(&self, filter: PostFilter, requested: PageNumber) -> Result<Page<Post>> {
        let paginator = Paginator::new(self.posts.count_posts(filter).await?);
        let number = paginator.clamp(requested);
        let object_list = self
            .posts
            .list_posts(filter, paginator.per_page(), paginator.offset(number))
            .await?;

        debug!(
            ?filter,
            page = number,
            num_pages = paginator.num_pages(),
            count = paginator.count(),
            "feed page composed"
        );
        Ok(paginator.page(number, object_list))
    }

    /// Every post.
    pub async fn global_feed(&self, page: PageNumber) -> Result<PostFeed> {
        FEED_REQUEST_TOTAL.with_label_values(&["index"]).inc();
        Ok(PostFeed {
            page_obj: self.paginate(PostFilter::All, page).await?,
        })
    }

    /// The rendered global feed, served from the page cache when fresh.
    ///
    /// The key is derived from the raw query string, so `?page=2` and
    /// `?page=02` are cached separately even though they show the same page.
    pub async fn rendered_global_feed(&self, query_string: &str, page: PageNumber) -> Result<String> {
        let key = page_cache_key("index", query_string);
        self.cache
            .get_or_render(&key, || async {
                let feed = self.global_feed(page).await?;
                presentation::render_body(View::Index, &feed)
            })
            .await
    }

    pub async fn group_feed(&self, slug: &str, page: PageNumber) -> Result<GroupFeed> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;

        FEED_REQUEST_TOTAL.with_label_values(&["group"]).inc();
        let page_obj = self.paginate(PostFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page_obj })
    }

    pub async fn profile_feed(
        &self,
        viewer: Option<&Identity>,
        username: &str,
        page: PageNumber,
    ) -> Result<ProfileFeed> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

        FEED_REQUEST_TOTAL.with_label_values(&["profile"]).inc();
        let page_obj = self.paginate(PostFilter::Author(author.id), page).await?;
        let following = self.follows.is_following(viewer, &author).await?;
        let itsme = viewer.is_some_and(|v| v.id == author.id);

        Ok(ProfileFeed {
            count: page_obj.count,
            author,
            page_obj,
            following,
            itsme,
        })
    }

    /// Posts by every author `reader` follows.
    pub async fn followed_feed(&self, reader: &Identity, page: PageNumber) -> Result<PostFeed> {
        FEED_REQUEST_TOTAL.with_label_values(&["follow"]).inc();
        Ok(PostFeed {
            page_obj: self.paginate(PostFilter::FollowedBy(reader.id), page).await?,
        })
    }
}
