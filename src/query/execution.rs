//! Running SeaQuery statements through an [`SqlExecutor`].
//!
//! All helpers build with `PostgresQueryBuilder` and bind through
//! [`with_converted_params`], so no value is ever spliced into SQL text.

use crate::executor::{DbError, SqlExecutor};
use crate::query::error_handling::is_no_rows_error;
use crate::query::value_conversion::with_converted_params;
use may_postgres::Row;
use sea_query::{PostgresQueryBuilder, SelectStatement};

/// Build a value from a result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error>;
}

fn parse<M: FromRow>(row: &Row) -> Result<M, DbError> {
    M::from_row(row).map_err(|e| DbError::Parse(format!("Failed to parse row: {e}")))
}

/// Execute the query and parse every row.
pub fn fetch_all<M, E>(executor: &E, query: &SelectStatement) -> Result<Vec<M>, DbError>
where
    M: FromRow,
    E: SqlExecutor + ?Sized,
{
    let (sql, values) = query.build(PostgresQueryBuilder);

    with_converted_params(&values, |params| {
        let rows = executor.query_all(&sql, params)?;
        rows.iter().map(parse).collect()
    })
}

/// Execute the query and return the single row, or `None` if nothing matched.
pub fn fetch_optional<M, E>(executor: &E, query: &SelectStatement) -> Result<Option<M>, DbError>
where
    M: FromRow,
    E: SqlExecutor + ?Sized,
{
    let (sql, values) = query.build(PostgresQueryBuilder);

    let result = with_converted_params(&values, |params| {
        let row = executor.query_one(&sql, params)?;
        parse(&row)
    });

    match result {
        Ok(model) => Ok(Some(model)),
        Err(e) if is_no_rows_error(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Execute a `SELECT COUNT(*) ...` query and return the count.
pub fn fetch_count<E>(executor: &E, query: &SelectStatement) -> Result<i64, DbError>
where
    E: SqlExecutor + ?Sized,
{
    let (sql, values) = query.build(PostgresQueryBuilder);

    with_converted_params(&values, |params| {
        let row = executor.query_one(&sql, params)?;
        row.try_get::<_, i64>(0)
            .map_err(|e| DbError::Parse(format!("Failed to read count: {e}")))
    })
}
