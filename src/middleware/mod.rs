//! Middleware module - identity extraction and rate limiting

pub mod identity;
pub mod rate_limit;

pub use identity::{IdentityLayer, USER_EMAIL_HEADER, USER_ID_HEADER};
pub use rate_limit::RateLimitLayer;
