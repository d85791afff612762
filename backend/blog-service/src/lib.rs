/// Blog Service Library
///
/// Serves the Yatube blogging platform: posts organized into groups, comments,
/// and a personalized feed built from followed authors.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `models`: Posts, groups, comments, follow edges and identities
/// - `services`: Feed composition, follow ledger, post mutations
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `cache`: Time-bounded page cache for the global feed
/// - `middleware`: Identity extraction, authorship guard, CSRF origin check
/// - `forms`: Post and comment form validation
/// - `pagination`: Fixed-size page slicing
/// - `presentation`: Render and redirect boundary
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod presentation;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
