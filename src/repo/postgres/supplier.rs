use crate::executor::{DbError, SqlExecutor};
use crate::model::{now_millis, PageRequest, Supplier, SupplierDraft, SupplierPage};
use crate::pool::DbPool;
use crate::query::{fetch_optional, FromRow};
use crate::raw_sql::find_optional;
use crate::repo::SupplierRepo;
use may_postgres::Row;
use sea_query::{Expr, ExprTrait, Query};
use uuid::Uuid;

use super::fetch_page;

const COLUMNS: [&str; 7] = [
    "id",
    "name",
    "email",
    "phone",
    "status_id",
    "is_verified_supplier",
    "created_at",
];

impl FromRow for Supplier {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        let phone: Option<String> = row.try_get("phone")?;
        Ok(Supplier {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: phone.unwrap_or_default(),
            status_id: row.try_get("status_id")?,
            is_verified_supplier: row.try_get("is_verified_supplier")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub struct PgSupplierRepo {
    pool: DbPool,
}

impl PgSupplierRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SupplierRepo for PgSupplierRepo {
    fn add(&self, draft: &SupplierDraft) -> Result<Supplier, DbError> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let created_at = now_millis();
        find_optional(
            &*conn,
            "INSERT INTO suppliers (id, name, email, phone, status_id, is_verified_supplier, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, name, email, phone, status_id, is_verified_supplier, created_at",
            &[
                &id,
                &draft.name,
                &draft.email,
                &draft.phone,
                &draft.status_id,
                &draft.is_verified_supplier,
                &created_at,
            ],
        )?
        .ok_or_else(|| DbError::Query("insert into suppliers returned no row".to_string()))
    }

    fn get(&self, id: Uuid) -> Result<Option<Supplier>, DbError> {
        let conn = self.pool.get()?;
        let query = Query::select()
            .columns(COLUMNS)
            .from("suppliers")
            .and_where(Expr::col("id").eq(id))
            .to_owned();
        fetch_optional(&*conn, &query)
    }

    fn list(&self, page: PageRequest) -> Result<SupplierPage, DbError> {
        let conn = self.pool.get()?;
        let (suppliers, total) = fetch_page(&*conn, "suppliers", &COLUMNS, page)?;
        Ok(SupplierPage {
            suppliers,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &SupplierDraft) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute(
            "UPDATE suppliers SET name = $1, email = $2, phone = $3, status_id = $4, \
             is_verified_supplier = $5 WHERE id = $6",
            &[
                &draft.name,
                &draft.email,
                &draft.phone,
                &draft.status_id,
                &draft.is_verified_supplier,
                &id,
            ],
        )?;
        Ok(n > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let n = conn.execute("DELETE FROM suppliers WHERE id = $1", &[&id])?;
        Ok(n > 0)
    }
}
