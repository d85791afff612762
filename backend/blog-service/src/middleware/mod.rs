/// Request middleware and guards
///
/// - `identity`: resolves the `Actor` from a bearer token
/// - `csrf`: rejects cross-site state-changing requests
/// - `permissions`: authorship and authentication checks used by handlers
pub mod csrf;
pub mod identity;
pub mod permissions;

pub use csrf::CsrfMiddleware;
pub use identity::{Actor, Claims, IdentityMiddleware, TokenVerifier};
pub use permissions::{can_edit, check_post_edit, require_identity, Access};
