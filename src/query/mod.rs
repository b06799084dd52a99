//! Query execution plumbing shared by the PostgreSQL repositories.
//!
//! - **Execution**: run a SeaQuery `SelectStatement` (`fetch_all`, `fetch_optional`, `fetch_count`)
//! - **Value Conversion**: SeaQuery `Value` to `ToSql` parameter conversion
//! - **Error Handling**: "no rows" detection

pub mod error_handling;
pub mod execution;
pub mod value_conversion;

pub use execution::{fetch_all, fetch_count, fetch_optional, FromRow};
pub use value_conversion::with_converted_params;
