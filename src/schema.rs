//! Table definitions.

use crate::executor::{DbError, SqlExecutor};
use crate::raw_sql::execute_unprepared;

/// Drop order respects the foreign keys.
const DROP_TABLES: &str = "
    DROP TABLE IF EXISTS product_stocks;
    DROP TABLE IF EXISTS products;
    DROP TABLE IF EXISTS brands;
    DROP TABLE IF EXISTS categories;
    DROP TABLE IF EXISTS suppliers;
";

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS brands (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        status_id INTEGER NOT NULL,
        created_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        parent_id UUID,
        sequence INTEGER,
        status_id INTEGER NOT NULL,
        created_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS suppliers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        phone VARCHAR(20),
        status_id INTEGER NOT NULL,
        is_verified_supplier BOOLEAN NOT NULL,
        created_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        description TEXT,
        specifications TEXT,
        brand_id UUID REFERENCES brands(id) NOT NULL,
        category_id UUID REFERENCES categories(id) NOT NULL,
        supplier_id UUID REFERENCES suppliers(id) NOT NULL,
        unit_price NUMERIC NOT NULL,
        discount_price NUMERIC,
        tags VARCHAR(255)[],
        status_id INTEGER NOT NULL,
        created_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS product_stocks (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        product_id UUID REFERENCES products(id) NOT NULL,
        stock_quantity INTEGER NOT NULL,
        updated_at BIGINT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_categories_parent_id ON categories(parent_id);
    CREATE INDEX IF NOT EXISTS idx_products_supplier_id ON products(supplier_id);
    CREATE INDEX IF NOT EXISTS idx_product_stocks_product_id ON product_stocks(product_id);
";

/// Statements run one at a time; none of the DDL above contains `;` inside a
/// statement.
fn statements(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn run_script<E: SqlExecutor + ?Sized>(executor: &E, script: &str) -> Result<(), DbError> {
    for statement in statements(script) {
        execute_unprepared(executor, statement)?;
    }
    Ok(())
}

/// Create any missing tables; existing data is kept.
pub fn create_schema<E: SqlExecutor + ?Sized>(executor: &E) -> Result<(), DbError> {
    run_script(executor, CREATE_TABLES)?;
    log::info!("schema ready");
    Ok(())
}

/// Drop every table and create them again, empty.
pub fn reset_schema<E: SqlExecutor + ?Sized>(executor: &E) -> Result<(), DbError> {
    run_script(executor, DROP_TABLES)?;
    log::warn!("dropped all catalog tables");
    create_schema(executor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_created_and_dropped() {
        for table in ["brands", "categories", "suppliers", "products", "product_stocks"] {
            assert!(CREATE_TABLES.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
            assert!(DROP_TABLES.contains(&format!("DROP TABLE IF EXISTS {table};")));
        }
    }

    #[test]
    fn test_script_splits_into_statements() {
        assert_eq!(statements(DROP_TABLES).count(), 5);
        assert_eq!(statements(CREATE_TABLES).count(), 8);
        assert!(statements(CREATE_TABLES).all(|s| s.starts_with("CREATE")));
    }

    #[test]
    fn test_dependents_dropped_first() {
        let stocks = DROP_TABLES.find("product_stocks").unwrap();
        let products = DROP_TABLES.find("TABLE IF EXISTS products;").unwrap();
        let brands = DROP_TABLES.find("brands").unwrap();
        assert!(stocks < products && products < brands);
    }
}
