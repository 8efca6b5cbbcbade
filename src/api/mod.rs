pub mod middleware;
pub mod rate_limit;
pub mod rest;

pub use rest::router;
