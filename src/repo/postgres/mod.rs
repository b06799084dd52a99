//! PostgreSQL repositories.
//!
//! Dynamic SELECTs (paging, counts, the product filter) are built with
//! SeaQuery; inserts, updates and deletes are fixed parameterized statements.
//! Ids are generated here, not by the database.

mod brand;
mod category;
mod product;
mod supplier;

pub use brand::PgBrandRepo;
pub use category::PgCategoryRepo;
pub use product::PgProductRepo;
pub use supplier::PgSupplierRepo;

use crate::executor::{DbError, SqlExecutor};
use crate::model::PageRequest;
use crate::query::{fetch_all, fetch_count, FromRow};
use sea_query::{Asterisk, Expr, Func, Order, Query, SelectStatement};

/// `SELECT <columns> FROM <table> ORDER BY created_at DESC LIMIT .. OFFSET ..`
/// plus the table's total row count.
fn fetch_page<M, E>(
    executor: &E,
    table: &'static str,
    columns: &[&'static str],
    page: PageRequest,
) -> Result<(Vec<M>, i64), DbError>
where
    M: FromRow,
    E: SqlExecutor + ?Sized,
{
    let rows = Query::select()
        .columns(columns.iter().copied())
        .from(table)
        .order_by("created_at", Order::Desc)
        .limit(page.limit)
        .offset(page.offset())
        .to_owned();
    let items = fetch_all(executor, &rows)?;
    let total = fetch_count(executor, &count_all(table))?;
    Ok((items, total))
}

fn count_all(table: &'static str) -> SelectStatement {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(table)
        .to_owned()
}
