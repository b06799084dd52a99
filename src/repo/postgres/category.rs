use crate::executor::{DbError, SqlExecutor};
use crate::model::{now_millis, Category, CategoryDraft, CategoryPage, PageRequest};
use crate::pool::DbPool;
use crate::query::{fetch_all, fetch_count, fetch_optional, FromRow};
use crate::raw_sql::find_optional;
use crate::repo::CategoryRepo;
use may_postgres::Row;
use sea_query::{Asterisk, Expr, ExprTrait, Func, Order, Query};
use uuid::Uuid;

use super::fetch_page;

const COLUMNS: [&str; 6] = ["id", "name", "parent_id", "sequence", "status_id", "created_at"];

impl FromRow for Category {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        Ok(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            parent_id: row.try_get("parent_id")?,
            sequence: row.try_get("sequence")?,
            status_id: row.try_get("status_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub struct PgCategoryRepo {
    pool: DbPool,
}

impl PgCategoryRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CategoryRepo for PgCategoryRepo {
    fn add(&self, draft: &CategoryDraft) -> Result<Category, DbError> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let created_at = now_millis();
        find_optional(
            &*conn,
            "INSERT INTO categories (id, name, parent_id, sequence, status_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, parent_id, sequence, status_id, created_at",
            &[
                &id,
                &draft.name,
                &draft.parent_id,
                &draft.sequence,
                &draft.status_id,
                &created_at,
            ],
        )?
        .ok_or_else(|| DbError::Query("insert into categories returned no row".to_string()))
    }

    fn get(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        let conn = self.pool.get()?;
        let query = Query::select()
            .columns(COLUMNS)
            .from("categories")
            .and_where(Expr::col("id").eq(id))
            .to_owned();
        fetch_optional(&*conn, &query)
    }

    fn list(&self, page: PageRequest) -> Result<CategoryPage, DbError> {
        let conn = self.pool.get()?;
        let (categories, total) = fetch_page(&*conn, "categories", &COLUMNS, page)?;
        Ok(CategoryPage {
            categories,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn list_all(&self) -> Result<Vec<Category>, DbError> {
        let conn = self.pool.get()?;
        let query = Query::select()
            .columns(COLUMNS)
            .from("categories")
            .order_by("created_at", Order::Desc)
            .order_by("id", Order::Asc)
            .to_owned();
        fetch_all(&*conn, &query)
    }

    fn count_children(&self, id: Uuid) -> Result<i64, DbError> {
        let conn = self.pool.get()?;
        let query = Query::select()
            .expr(Func::count(Expr::col(Asterisk)))
            .from("categories")
            .and_where(Expr::col("parent_id").eq(id))
            .to_owned();
        fetch_count(&*conn, &query)
    }

    fn update(&self, id: Uuid, draft: &CategoryDraft) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute(
            "UPDATE categories SET name = $1, parent_id = $2, sequence = $3, status_id = $4 \
             WHERE id = $5",
            &[
                &draft.name,
                &draft.parent_id,
                &draft.sequence,
                &draft.status_id,
                &id,
            ],
        )?;
        Ok(n > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute("DELETE FROM categories WHERE id = $1", &[&id])?;
        Ok(n > 0)
    }
}
