/// Business logic layer
///
/// - `feed`: the four paginated feeds and the cached global feed
/// - `follow`: the follow ledger
/// - `posts`: post detail, create, edit and comments
pub mod feed;
pub mod follow;
pub mod posts;

pub use feed::{FeedComposer, GroupFeed, PostFeed, ProfileFeed};
pub use follow::{FollowLedger, FollowOutcome};
pub use posts::{PostDetail, PostService};
