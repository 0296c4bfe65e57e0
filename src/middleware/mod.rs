mod auth;
mod rate_limit;

pub use auth::auth_middleware;
pub use rate_limit::{RateLimiter, rate_limit};
