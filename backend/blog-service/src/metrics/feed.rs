use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Feed pages served, by feed kind (index, group, profile, follow).
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Feed pages composed segmented by feed kind",
        &["feed"]
    )
    .expect("failed to register feed_request_total");

    /// Page cache events (hit/miss/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "page_cache_events_total",
        "Page cache lookups segmented by outcome",
        &["event"]
    )
    .expect("failed to register page_cache_events_total");

    /// Follow ledger mutations by action and outcome.
    pub static ref FOLLOW_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "follow_mutations_total",
        "Follow and unfollow requests segmented by action and outcome",
        &["action", "result"]
    )
    .expect("failed to register follow_mutations_total");

    /// Edit attempts bounced to the read-only view.
    pub static ref EDIT_GUARD_DENIALS_TOTAL: IntCounter = register_int_counter!(
        "edit_guard_denials_total",
        "Post edit attempts by someone other than the author"
    )
    .expect("failed to register edit_guard_denials_total");
}
