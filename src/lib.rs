pub mod config;
pub mod domain;
pub mod handler;
pub mod memory;
pub mod ratelimit;
pub mod validate;
