//! Value conversion from SeaQuery to may_postgres.
//!
//! SeaQuery builds a statement into `(String, Values)`. `may_postgres` wants
//! `&[&dyn ToSql]`, so the values are first collected into typed vectors and
//! then borrowed in statement order.

use crate::executor::DbError;
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;
use uuid::Uuid;

/// Convert SeaQuery values to may_postgres parameters and run `f` with them.
///
/// The parameter slice only lives for the duration of the closure.
///
/// # Errors
///
/// Returns `DbError::Query` for value types the catalog never binds, or an
/// unsigned value that does not fit in `i64`. Otherwise returns whatever `f`
/// returns.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, DbError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DbError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut uuids: Vec<Uuid> = Vec::new();
    let mut decimals: Vec<Decimal> = Vec::new();
    let mut nulls: Vec<Option<i32>> = Vec::new();

    // First pass: own every value
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::TinyInt(Some(i)) => ints.push(i32::from(*i)),
            Value::SmallInt(Some(i)) => ints.push(i32::from(*i)),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::TinyUnsigned(Some(u)) => ints.push(i32::from(*u)),
            Value::SmallUnsigned(Some(u)) => ints.push(i32::from(*u)),
            Value::Unsigned(Some(u)) => big_ints.push(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => {
                let v = i64::try_from(*u).map_err(|_| {
                    DbError::Query(format!(
                        "BigUnsigned value {} exceeds i64::MAX, cannot be bound",
                        u
                    ))
                })?;
                big_ints.push(v);
            }
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Uuid(Some(u)) => uuids.push(Uuid::clone(u)),
            Value::Decimal(Some(d)) => decimals.push(Decimal::clone(d)),
            Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::String(None)
            | Value::Uuid(None)
            | Value::Decimal(None) => nulls.push(None),
            _ => {
                return Err(DbError::Query(format!(
                    "Unsupported value type in query: {:?}",
                    value
                )));
            }
        }
    }

    // Second pass: borrow in statement order
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut uuid_idx = 0;
    let mut decimal_idx = 0;
    let mut null_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.iter().count());

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::TinyInt(Some(_))
            | Value::SmallInt(Some(_))
            | Value::Int(Some(_))
            | Value::TinyUnsigned(Some(_))
            | Value::SmallUnsigned(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Uuid(Some(_)) => {
                params.push(&uuids[uuid_idx] as &dyn ToSql);
                uuid_idx += 1;
            }
            Value::Decimal(Some(_)) => {
                params.push(&decimals[decimal_idx] as &dyn ToSql);
                decimal_idx += 1;
            }
            _ => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Expr, ExprTrait, PostgresQueryBuilder, Query};

    #[test]
    fn test_params_follow_statement_order() {
        let id = Uuid::new_v4();
        let (sql, values) = Query::select()
            .column("id")
            .from("products")
            .and_where(Expr::col("status").eq(1))
            .and_where(Expr::col("category_id").eq(id))
            .and_where(Expr::col("unit_price").gte(Decimal::new(1999, 2)))
            .and_where(Expr::col("product_name").eq("Legion 5"))
            .limit(10)
            .build(PostgresQueryBuilder);

        assert!(sql.contains("$5"));
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_unsupported_value_is_rejected() {
        let values = sea_query::Values(vec![Value::Double(Some(1.5))]);
        let err = with_converted_params(&values, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("Unsupported value type"));
    }

    #[test]
    fn test_big_unsigned_overflow_is_rejected() {
        let values = sea_query::Values(vec![Value::BigUnsigned(Some(u64::MAX))]);
        assert!(with_converted_params(&values, |_| Ok(())).is_err());
    }
}
