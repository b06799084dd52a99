//! Connection pooling for `may_postgres`.

pub mod config;
pub mod manager;

pub use config::DatabaseConfig;
pub use manager::{DbPool, PooledConnection};
