//! Repository traits and their backends.
//!
//! The service only sees the traits. [`postgres`] implements them over the
//! connection pool; [`memory`] keeps everything in process and backs the
//! tests and `serve-rest --in-memory`.

pub mod memory;
pub mod postgres;

use crate::executor::DbError;
use crate::model::{
    Brand, BrandDraft, BrandPage, Category, CategoryDraft, CategoryPage, FilterProductsParams,
    PageRequest, Product, ProductDraft, ProductPage, Supplier, SupplierDraft, SupplierPage,
};
use crate::pool::DbPool;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;

/// Brand persistence. `update` and `delete` return `false` when the id is unknown.
pub trait BrandRepo: Send + Sync {
    fn add(&self, draft: &BrandDraft) -> Result<Brand, DbError>;
    fn get(&self, id: Uuid) -> Result<Option<Brand>, DbError>;
    /// Newest first.
    fn list(&self, page: PageRequest) -> Result<BrandPage, DbError>;
    fn update(&self, id: Uuid, draft: &BrandDraft) -> Result<bool, DbError>;
    fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

/// Category persistence; the flat store the tree is built from.
pub trait CategoryRepo: Send + Sync {
    fn add(&self, draft: &CategoryDraft) -> Result<Category, DbError>;
    fn get(&self, id: Uuid) -> Result<Option<Category>, DbError>;
    /// Newest first.
    fn list(&self, page: PageRequest) -> Result<CategoryPage, DbError>;
    /// Every category, oldest first.
    fn list_all(&self) -> Result<Vec<Category>, DbError>;
    fn count_children(&self, id: Uuid) -> Result<i64, DbError>;
    fn update(&self, id: Uuid, draft: &CategoryDraft) -> Result<bool, DbError>;
    fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

pub trait SupplierRepo: Send + Sync {
    fn add(&self, draft: &SupplierDraft) -> Result<Supplier, DbError>;
    fn get(&self, id: Uuid) -> Result<Option<Supplier>, DbError>;
    /// Newest first.
    fn list(&self, page: PageRequest) -> Result<SupplierPage, DbError>;
    fn update(&self, id: Uuid, draft: &SupplierDraft) -> Result<bool, DbError>;
    fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

/// What a product points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRef {
    Brand(Uuid),
    Category(Uuid),
    Supplier(Uuid),
}

/// Product persistence. Product and stock rows are always written together.
pub trait ProductRepo: Send + Sync {
    fn add(&self, draft: &ProductDraft) -> Result<Product, DbError>;
    fn get(&self, id: Uuid) -> Result<Option<Product>, DbError>;
    /// Active products matching the filter, cheapest first.
    fn filter(&self, params: &FilterProductsParams) -> Result<ProductPage, DbError>;
    fn update(&self, id: Uuid, draft: &ProductDraft) -> Result<bool, DbError>;
    fn delete(&self, id: Uuid) -> Result<bool, DbError>;
    /// Products of any status referencing the given record.
    fn count_referencing(&self, target: ProductRef) -> Result<i64, DbError>;
    /// Whether an active product of `supplier_id` already uses `name`.
    fn name_taken(&self, supplier_id: Uuid, name: &str, exclude: Option<Uuid>) -> Result<bool, DbError>;
}

/// The four repositories the service works with.
#[derive(Clone)]
pub struct Repositories {
    pub brands: Arc<dyn BrandRepo>,
    pub categories: Arc<dyn CategoryRepo>,
    pub suppliers: Arc<dyn SupplierRepo>,
    pub products: Arc<dyn ProductRepo>,
}

impl Repositories {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            brands: Arc::new(postgres::PgBrandRepo::new(pool.clone())),
            categories: Arc::new(postgres::PgCategoryRepo::new(pool.clone())),
            suppliers: Arc::new(postgres::PgSupplierRepo::new(pool.clone())),
            products: Arc::new(postgres::PgProductRepo::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            brands: Arc::new(store.clone()),
            categories: Arc::new(store.clone()),
            suppliers: Arc::new(store.clone()),
            products: Arc::new(store),
        }
    }
}
