//! # Catalog
//!
//! E-commerce catalog backend: brands, categories, suppliers and products
//! stored in PostgreSQL and served over a coroutine-based REST API.
//!
//! - [`pool`] / [`executor`] / [`transaction`]: `may_postgres` plumbing
//! - [`repo`]: persistence traits with PostgreSQL and in-memory stores
//! - [`tree`]: builds the category hierarchy from flat records
//! - [`service`]: business rules shared by the API and the seeder
//! - [`http`]: routing, validation and the `may_minihttp` server
//!
//! See the README for configuration and the CLI.

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod http;
pub mod metrics;
pub mod model;
pub mod pool;
pub mod query;
pub mod raw_sql;
pub mod repo;
pub mod schema;
pub mod seed;
pub mod service;
pub mod transaction;
pub mod tree;

pub use config::{ApplicationConfig, Settings};
pub use connection::{connect, ConnectionError};
pub use error::ServiceError;
pub use executor::{DbError, PgExecutor, SqlExecutor};
pub use pool::{DatabaseConfig, DbPool, PooledConnection};
pub use raw_sql::{execute_unprepared, find_optional};
pub use repo::Repositories;
pub use service::CatalogService;
pub use transaction::{Transaction, TransactionError};
pub use tree::{build_category_tree, CategoryNode, CategoryView, SiblingOrder, TreeError};
