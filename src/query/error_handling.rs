//! Error classification for query results.

use crate::executor::DbError;

const NO_ROWS_PATTERNS: [&str; 5] = [
    "no rows",
    "no row",
    "row not found",
    "expected one row",
    // `query_one` on an empty result
    "unexpected number of rows",
];

fn matches_no_rows(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    NO_ROWS_PATTERNS.iter().any(|p| msg.contains(p))
}

/// Check if an error represents a "no rows found" condition.
///
/// `query_one` reports an empty result as an error; lookups by id turn that
/// into `Ok(None)`. Only the specific "no rows" wording matches, so "table not
/// found" or "column not found" stay real errors.
pub(crate) fn is_no_rows_error(error: &DbError) -> bool {
    match error {
        DbError::Postgres(pg_error) => matches_no_rows(&pg_error.to_string()),
        DbError::Query(msg) | DbError::Other(msg) => matches_no_rows(msg),
        DbError::Parse(_) | DbError::Pool(_) => false,
    }
}
