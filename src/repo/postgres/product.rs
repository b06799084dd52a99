use crate::executor::{DbError, SqlExecutor};
use crate::model::{
    now_millis, Brand, Category, FilterProductsParams, Product, ProductDraft, ProductPage,
    ProductStock, Status, Supplier,
};
use crate::pool::DbPool;
use crate::query::{fetch_all, fetch_count, fetch_optional, FromRow};
use crate::repo::{ProductRef, ProductRepo};
use may_postgres::Row;
use rust_decimal::Decimal;
use sea_query::{Expr, ExprTrait, Func, Order, Query, SelectStatement};
use uuid::Uuid;

/// `(table, column, alias)` for the hydrated product read.
const HYDRATED_COLUMNS: [(&str, &str, &str); 30] = [
    ("products", "id", "p_id"),
    ("products", "name", "p_name"),
    ("products", "description", "p_description"),
    ("products", "specifications", "p_specifications"),
    ("products", "unit_price", "p_unit_price"),
    ("products", "discount_price", "p_discount_price"),
    ("products", "tags", "p_tags"),
    ("products", "status_id", "p_status_id"),
    ("products", "created_at", "p_created_at"),
    ("brands", "id", "b_id"),
    ("brands", "name", "b_name"),
    ("brands", "status_id", "b_status_id"),
    ("brands", "created_at", "b_created_at"),
    ("categories", "id", "c_id"),
    ("categories", "name", "c_name"),
    ("categories", "parent_id", "c_parent_id"),
    ("categories", "sequence", "c_sequence"),
    ("categories", "status_id", "c_status_id"),
    ("categories", "created_at", "c_created_at"),
    ("suppliers", "id", "s_id"),
    ("suppliers", "name", "s_name"),
    ("suppliers", "email", "s_email"),
    ("suppliers", "phone", "s_phone"),
    ("suppliers", "status_id", "s_status_id"),
    ("suppliers", "is_verified_supplier", "s_is_verified_supplier"),
    ("suppliers", "created_at", "s_created_at"),
    ("product_stocks", "id", "ps_id"),
    ("product_stocks", "product_id", "ps_product_id"),
    ("product_stocks", "stock_quantity", "ps_stock_quantity"),
    ("product_stocks", "updated_at", "ps_updated_at"),
];

impl FromRow for Product {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        let description: Option<String> = row.try_get("p_description")?;
        let specifications: Option<String> = row.try_get("p_specifications")?;
        let discount_price: Option<Decimal> = row.try_get("p_discount_price")?;
        let tags: Option<Vec<String>> = row.try_get("p_tags")?;
        let phone: Option<String> = row.try_get("s_phone")?;
        let stock_quantity: Option<i32> = row.try_get("ps_stock_quantity")?;
        let stock_updated_at: Option<i64> = row.try_get("ps_updated_at")?;

        Ok(Product {
            id: row.try_get("p_id")?,
            name: row.try_get("p_name")?,
            description: description.unwrap_or_default(),
            specifications: specifications.unwrap_or_default(),
            brand: Brand {
                id: row.try_get("b_id")?,
                name: row.try_get("b_name")?,
                status_id: row.try_get("b_status_id")?,
                created_at: row.try_get("b_created_at")?,
            },
            category: Category {
                id: row.try_get("c_id")?,
                name: row.try_get("c_name")?,
                parent_id: row.try_get("c_parent_id")?,
                sequence: row.try_get("c_sequence")?,
                status_id: row.try_get("c_status_id")?,
                created_at: row.try_get("c_created_at")?,
            },
            supplier: Supplier {
                id: row.try_get("s_id")?,
                name: row.try_get("s_name")?,
                email: row.try_get("s_email")?,
                phone: phone.unwrap_or_default(),
                status_id: row.try_get("s_status_id")?,
                is_verified_supplier: row.try_get("s_is_verified_supplier")?,
                created_at: row.try_get("s_created_at")?,
            },
            unit_price: row.try_get("p_unit_price")?,
            discount_price: discount_price.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
            status_id: row.try_get("p_status_id")?,
            created_at: row.try_get("p_created_at")?,
            product_stock: ProductStock {
                id: row.try_get("ps_id")?,
                product_id: row.try_get("ps_product_id")?,
                stock_quantity: stock_quantity.unwrap_or_default(),
                updated_at: stock_updated_at.unwrap_or_default(),
            },
        })
    }
}

/// Products joined with their brand, category, supplier and stock row.
fn hydrated_select() -> SelectStatement {
    let mut query = Query::select();
    for (table, column, alias) in HYDRATED_COLUMNS {
        query.expr_as(Expr::col((table, column)), alias);
    }
    query
        .from("products")
        .inner_join("brands", Expr::cust("brands.id = products.brand_id"))
        .inner_join("categories", Expr::cust("categories.id = products.category_id"))
        .inner_join("suppliers", Expr::cust("suppliers.id = products.supplier_id"))
        .left_join(
            "product_stocks",
            Expr::cust("product_stocks.product_id = products.id"),
        );
    query
}

fn apply_filter(query: &mut SelectStatement, params: &FilterProductsParams) {
    query
        .and_where(Expr::col(("products", "status_id")).eq(Status::ACTIVE_ID))
        .and_where(Expr::col(("products", "unit_price")).gte(params.min_price));

    if params.has_max_price() {
        query.and_where(Expr::col(("products", "unit_price")).lte(params.max_price));
    }
    if let Some(name) = &params.name {
        query.and_where(Expr::col(("products", "name")).eq(name.as_str()));
    }
    if !params.brand_ids.is_empty() {
        query.and_where(Expr::col(("products", "brand_id")).is_in(params.brand_ids.iter().copied()));
    }
    if let Some(category_id) = params.category_id {
        query.and_where(Expr::col(("products", "category_id")).eq(category_id));
    }
    if let Some(supplier_id) = params.supplier_id {
        query.and_where(Expr::col(("products", "supplier_id")).eq(supplier_id));
    }
    if params.is_verified_supplier {
        query.and_where(Expr::col(("suppliers", "is_verified_supplier")).eq(true));
    }
}

pub struct PgProductRepo {
    pool: DbPool,
}

impl PgProductRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepo for PgProductRepo {
    fn add(&self, draft: &ProductDraft) -> Result<Product, DbError> {
        let id = Uuid::new_v4();
        let now = now_millis();
        {
            let conn = self.pool.get()?;
            let tx = conn.begin()?;
            tx.execute(
                "INSERT INTO products (id, name, description, specifications, brand_id, category_id, \
                 supplier_id, unit_price, discount_price, tags, status_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                &[
                    &id,
                    &draft.name,
                    &draft.description,
                    &draft.specifications,
                    &draft.brand_id,
                    &draft.category_id,
                    &draft.supplier_id,
                    &draft.unit_price,
                    &draft.discount_price,
                    &draft.tags,
                    &draft.status_id,
                    &now,
                ],
            )?;
            tx.execute(
                "INSERT INTO product_stocks (id, product_id, stock_quantity, updated_at) \
                 VALUES ($1, $2, $3, $4)",
                &[&Uuid::new_v4(), &id, &draft.stock_quantity, &now],
            )?;
            tx.commit()?;
        }

        self.get(id)?
            .ok_or_else(|| DbError::Query(format!("product {id} missing after insert")))
    }

    fn get(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        let conn = self.pool.get()?;
        let query = hydrated_select()
            .and_where(Expr::col(("products", "id")).eq(id))
            .to_owned();
        fetch_optional(&*conn, &query)
    }

    fn filter(&self, params: &FilterProductsParams) -> Result<ProductPage, DbError> {
        let page = params.effective_page();
        let offset = page.saturating_sub(1).saturating_mul(params.limit);

        let mut rows = hydrated_select();
        apply_filter(&mut rows, params);
        rows.order_by(("products", "unit_price"), Order::Asc)
            .order_by(("products", "id"), Order::Asc)
            .limit(params.limit)
            .offset(offset);

        let mut count = Query::select();
        count
            .expr(Func::count(Expr::col(("products", "id"))))
            .from("products")
            .inner_join("suppliers", Expr::cust("suppliers.id = products.supplier_id"));
        apply_filter(&mut count, params);

        let conn = self.pool.get()?;
        let products = fetch_all(&*conn, &rows)?;
        let total = fetch_count(&*conn, &count)?;

        Ok(ProductPage {
            products,
            total,
            page,
            limit: params.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &ProductDraft) -> Result<bool, DbError> {
        let now = now_millis();
        let conn = self.pool.get()?;
        let tx = conn.begin()?;

        let n = tx.execute(
            "UPDATE products SET name = $1, description = $2, specifications = $3, brand_id = $4, \
             category_id = $5, supplier_id = $6, unit_price = $7, discount_price = $8, tags = $9, \
             status_id = $10 WHERE id = $11",
            &[
                &draft.name,
                &draft.description,
                &draft.specifications,
                &draft.brand_id,
                &draft.category_id,
                &draft.supplier_id,
                &draft.unit_price,
                &draft.discount_price,
                &draft.tags,
                &draft.status_id,
                &id,
            ],
        )?;
        if n == 0 {
            tx.rollback()?;
            return Ok(false);
        }

        let stocked = tx.execute(
            "UPDATE product_stocks SET stock_quantity = $1, updated_at = $2 WHERE product_id = $3",
            &[&draft.stock_quantity, &now, &id],
        )?;
        if stocked == 0 {
            tx.execute(
                "INSERT INTO product_stocks (id, product_id, stock_quantity, updated_at) \
                 VALUES ($1, $2, $3, $4)",
                &[&Uuid::new_v4(), &id, &draft.stock_quantity, &now],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let conn = self.pool.get()?;
        let tx = conn.begin()?;
        tx.execute("DELETE FROM product_stocks WHERE product_id = $1", &[&id])?;
        let n = tx.execute("DELETE FROM products WHERE id = $1", &[&id])?;
        tx.commit()?;
        Ok(n > 0)
    }

    fn count_referencing(&self, target: ProductRef) -> Result<i64, DbError> {
        let (column, id) = match target {
            ProductRef::Brand(id) => ("brand_id", id),
            ProductRef::Category(id) => ("category_id", id),
            ProductRef::Supplier(id) => ("supplier_id", id),
        };
        let query = Query::select()
            .expr(Func::count(Expr::col("id")))
            .from("products")
            .and_where(Expr::col(column).eq(id))
            .to_owned();

        let conn = self.pool.get()?;
        fetch_count(&*conn, &query)
    }

    fn name_taken(&self, supplier_id: Uuid, name: &str, exclude: Option<Uuid>) -> Result<bool, DbError> {
        let mut query = Query::select();
        query
            .expr(Func::count(Expr::col("id")))
            .from("products")
            .and_where(Expr::col("supplier_id").eq(supplier_id))
            .and_where(Expr::col("name").eq(name))
            .and_where(Expr::col("status_id").eq(Status::ACTIVE_ID));
        if let Some(own_id) = exclude {
            query.and_where(Expr::col("id").ne(own_id));
        }

        let conn = self.pool.get()?;
        Ok(fetch_count(&*conn, &query)? > 0)
    }
}
