pub mod client_ip;
pub mod rate_limit;

pub use client_ip::ClientIp;
pub use rate_limit::{login_limiter, RateLimiter};
