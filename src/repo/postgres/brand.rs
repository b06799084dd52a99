use crate::executor::{DbError, SqlExecutor};
use crate::model::{now_millis, Brand, BrandDraft, BrandPage, PageRequest};
use crate::pool::DbPool;
use crate::query::{fetch_optional, FromRow};
use crate::raw_sql::find_optional;
use crate::repo::BrandRepo;
use may_postgres::Row;
use sea_query::{Expr, ExprTrait, Query};
use uuid::Uuid;

use super::fetch_page;

const COLUMNS: [&str; 4] = ["id", "name", "status_id", "created_at"];

impl FromRow for Brand {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        Ok(Brand {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            status_id: row.try_get("status_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub struct PgBrandRepo {
    pool: DbPool,
}

impl PgBrandRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BrandRepo for PgBrandRepo {
    fn add(&self, draft: &BrandDraft) -> Result<Brand, DbError> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let created_at = now_millis();
        find_optional(
            &*conn,
            "INSERT INTO brands (id, name, status_id, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, status_id, created_at",
            &[&id, &draft.name, &draft.status_id, &created_at],
        )?
        .ok_or_else(|| DbError::Query("insert into brands returned no row".to_string()))
    }

    fn get(&self, id: Uuid) -> Result<Option<Brand>, DbError> {
        let conn = self.pool.get()?;
        let query = Query::select()
            .columns(COLUMNS)
            .from("brands")
            .and_where(Expr::col("id").eq(id))
            .to_owned();
        fetch_optional(&*conn, &query)
    }

    fn list(&self, page: PageRequest) -> Result<BrandPage, DbError> {
        let conn = self.pool.get()?;
        let (brands, total) = fetch_page(&*conn, "brands", &COLUMNS, page)?;
        Ok(BrandPage {
            brands,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &BrandDraft) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute(
            "UPDATE brands SET name = $1, status_id = $2 WHERE id = $3",
            &[&draft.name, &draft.status_id, &id],
        )?;
        Ok(n > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute("DELETE FROM brands WHERE id = $1", &[&id])?;
        Ok(n > 0)
    }
}
