use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Brand, Category, Supplier};

/// A product with its brand, category, supplier and stock hydrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub specifications: String,
    pub brand: Brand,
    pub category: Category,
    pub supplier: Supplier,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_price: Decimal,
    pub tags: Vec<String>,
    pub status_id: i32,
    pub created_at: i64,
    pub product_stock: ProductStock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    pub stock_quantity: i32,
    pub updated_at: i64,
}

/// Column values for a product write plus the stock quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub specifications: String,
    pub brand_id: Uuid,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub unit_price: Decimal,
    pub discount_price: Decimal,
    pub tags: Vec<String>,
    pub status_id: i32,
    pub stock_quantity: i32,
}

/// Product listing filter. Only active products are ever listed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterProductsParams {
    /// Exact product name
    pub name: Option<String>,
    pub min_price: Decimal,
    /// Zero means unbounded
    pub max_price: Decimal,
    pub brand_ids: Vec<Uuid>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// Restrict to products whose supplier is verified
    pub is_verified_supplier: bool,
    pub page: u64,
    pub limit: u64,
}

impl Default for FilterProductsParams {
    fn default() -> Self {
        Self {
            name: None,
            min_price: Decimal::ZERO,
            max_price: Decimal::ZERO,
            brand_ids: Vec::new(),
            category_id: None,
            supplier_id: None,
            is_verified_supplier: false,
            page: 1,
            limit: 10,
        }
    }
}

impl FilterProductsParams {
    /// The page to serve; 0 means the first page.
    pub fn effective_page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn has_max_price(&self) -> bool {
        self.max_price > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u64,
    pub limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_ids_skipped_when_absent() {
        let stock = ProductStock {
            id: None,
            product_id: None,
            stock_quantity: 4,
            updated_at: 1,
        };
        let json = serde_json::to_value(&stock).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("product_id").is_none());
        assert_eq!(json["stock_quantity"], 4);
    }

    #[test]
    fn test_filter_defaults() {
        let f = FilterProductsParams {
            page: 0,
            ..FilterProductsParams::default()
        };
        assert_eq!(f.effective_page(), 1);
        assert!(!f.has_max_price());
    }
}
