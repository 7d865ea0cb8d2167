pub mod config;
pub mod limiter;
