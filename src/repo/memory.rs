//! In-process store implementing every repository trait.
//!
//! One `MemoryStore` holds all four tables behind a single mutex so product
//! reads can hydrate brand, category and supplier consistently. Foreign keys
//! are enforced the way the PostgreSQL schema enforces them: a product must
//! point at existing rows, and a referenced row cannot be deleted.

use crate::executor::DbError;
use crate::model::{
    now_millis, Brand, BrandDraft, BrandPage, Category, CategoryDraft, CategoryPage,
    FilterProductsParams, PageRequest, Product, ProductDraft, ProductPage, ProductStock, Status,
    Supplier, SupplierDraft, SupplierPage,
};
use crate::repo::{BrandRepo, CategoryRepo, ProductRef, ProductRepo, SupplierRepo};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredProduct {
    id: Uuid,
    draft: ProductDraft,
    created_at: i64,
    stock_id: Uuid,
    stock_updated_at: i64,
}

impl StoredProduct {
    fn references(&self, target: ProductRef) -> bool {
        match target {
            ProductRef::Brand(id) => self.draft.brand_id == id,
            ProductRef::Category(id) => self.draft.category_id == id,
            ProductRef::Supplier(id) => self.draft.supplier_id == id,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    brands: Vec<Brand>,
    categories: Vec<Category>,
    suppliers: Vec<Supplier>,
    products: Vec<StoredProduct>,
}

impl State {
    fn hydrate(&self, stored: &StoredProduct) -> Result<Product, DbError> {
        let d = &stored.draft;
        let brand = self.brands.iter().find(|b| b.id == d.brand_id);
        let category = self.categories.iter().find(|c| c.id == d.category_id);
        let supplier = self.suppliers.iter().find(|s| s.id == d.supplier_id);
        let (Some(brand), Some(category), Some(supplier)) = (brand, category, supplier) else {
            return Err(DbError::Query(format!(
                "product {} references a missing row",
                stored.id
            )));
        };

        Ok(Product {
            id: stored.id,
            name: d.name.clone(),
            description: d.description.clone(),
            specifications: d.specifications.clone(),
            brand: brand.clone(),
            category: category.clone(),
            supplier: supplier.clone(),
            unit_price: d.unit_price,
            discount_price: d.discount_price,
            tags: d.tags.clone(),
            status_id: d.status_id,
            created_at: stored.created_at,
            product_stock: ProductStock {
                id: Some(stored.stock_id),
                product_id: Some(stored.id),
                stock_quantity: d.stock_quantity,
                updated_at: stored.stock_updated_at,
            },
        })
    }

    fn check_references(&self, draft: &ProductDraft) -> Result<(), DbError> {
        let ok = self.brands.iter().any(|b| b.id == draft.brand_id)
            && self.categories.iter().any(|c| c.id == draft.category_id)
            && self.suppliers.iter().any(|s| s.id == draft.supplier_id);
        if ok {
            Ok(())
        } else {
            Err(DbError::Query(
                "product violates a foreign key constraint".to_string(),
            ))
        }
    }

    fn ensure_unreferenced(&self, target: ProductRef) -> Result<(), DbError> {
        if self.products.iter().any(|p| p.references(target)) {
            return Err(DbError::Query(format!(
                "{target:?} is still referenced from products"
            )));
        }
        Ok(())
    }
}

/// Newest first; equal timestamps keep the later insert first.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> i64) -> Vec<T> {
    let mut sorted: Vec<T> = items.iter().rev().cloned().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    sorted
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DbError> {
        self.state
            .lock()
            .map_err(|_| DbError::Other("memory store lock poisoned".to_string()))
    }
}

impl BrandRepo for MemoryStore {
    fn add(&self, draft: &BrandDraft) -> Result<Brand, DbError> {
        let brand = Brand {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            status_id: draft.status_id,
            created_at: now_millis(),
        };
        self.lock()?.brands.push(brand.clone());
        Ok(brand)
    }

    fn get(&self, id: Uuid) -> Result<Option<Brand>, DbError> {
        Ok(self.lock()?.brands.iter().find(|b| b.id == id).cloned())
    }

    fn list(&self, page: PageRequest) -> Result<BrandPage, DbError> {
        let state = self.lock()?;
        let total = state.brands.len() as i64;
        let brands = paginate(newest_first(&state.brands, |b| b.created_at), page);
        Ok(BrandPage {
            brands,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &BrandDraft) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        match state.brands.iter_mut().find(|b| b.id == id) {
            Some(brand) => {
                brand.name = draft.name.clone();
                brand.status_id = draft.status_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        state.ensure_unreferenced(ProductRef::Brand(id))?;
        let before = state.brands.len();
        state.brands.retain(|b| b.id != id);
        Ok(state.brands.len() < before)
    }
}

impl CategoryRepo for MemoryStore {
    fn add(&self, draft: &CategoryDraft) -> Result<Category, DbError> {
        let category = Category {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            parent_id: draft.parent_id,
            sequence: draft.sequence,
            status_id: draft.status_id,
            created_at: now_millis(),
        };
        self.lock()?.categories.push(category.clone());
        Ok(category)
    }

    fn get(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        Ok(self.lock()?.categories.iter().find(|c| c.id == id).cloned())
    }

    fn list(&self, page: PageRequest) -> Result<CategoryPage, DbError> {
        let state = self.lock()?;
        let total = state.categories.len() as i64;
        let categories = paginate(newest_first(&state.categories, |c| c.created_at), page);
        Ok(CategoryPage {
            categories,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn list_all(&self) -> Result<Vec<Category>, DbError> {
        let state = self.lock()?;
        Ok(newest_first(&state.categories, |c| c.created_at))
    }

    fn count_children(&self, id: Uuid) -> Result<i64, DbError> {
        let state = self.lock()?;
        Ok(state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .count() as i64)
    }

    fn update(&self, id: Uuid, draft: &CategoryDraft) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        match state.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.name = draft.name.clone();
                category.parent_id = draft.parent_id;
                category.sequence = draft.sequence;
                category.status_id = draft.status_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        state.ensure_unreferenced(ProductRef::Category(id))?;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() < before)
    }
}

impl SupplierRepo for MemoryStore {
    fn add(&self, draft: &SupplierDraft) -> Result<Supplier, DbError> {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            status_id: draft.status_id,
            is_verified_supplier: draft.is_verified_supplier,
            created_at: now_millis(),
        };
        self.lock()?.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    fn get(&self, id: Uuid) -> Result<Option<Supplier>, DbError> {
        Ok(self.lock()?.suppliers.iter().find(|s| s.id == id).cloned())
    }

    fn list(&self, page: PageRequest) -> Result<SupplierPage, DbError> {
        let state = self.lock()?;
        let total = state.suppliers.len() as i64;
        let suppliers = paginate(newest_first(&state.suppliers, |s| s.created_at), page);
        Ok(SupplierPage {
            suppliers,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &SupplierDraft) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        match state.suppliers.iter_mut().find(|s| s.id == id) {
            Some(supplier) => {
                supplier.name = draft.name.clone();
                supplier.email = draft.email.clone();
                supplier.phone = draft.phone.clone();
                supplier.status_id = draft.status_id;
                supplier.is_verified_supplier = draft.is_verified_supplier;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        state.ensure_unreferenced(ProductRef::Supplier(id))?;
        let before = state.suppliers.len();
        state.suppliers.retain(|s| s.id != id);
        Ok(state.suppliers.len() < before)
    }
}

impl ProductRepo for MemoryStore {
    fn add(&self, draft: &ProductDraft) -> Result<Product, DbError> {
        let mut state = self.lock()?;
        state.check_references(draft)?;

        let now = now_millis();
        let stored = StoredProduct {
            id: Uuid::new_v4(),
            draft: draft.clone(),
            created_at: now,
            stock_id: Uuid::new_v4(),
            stock_updated_at: now,
        };
        let product = state.hydrate(&stored)?;
        state.products.push(stored);
        Ok(product)
    }

    fn get(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        let state = self.lock()?;
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.hydrate(p))
            .transpose()
    }

    fn filter(&self, params: &FilterProductsParams) -> Result<ProductPage, DbError> {
        let state = self.lock()?;
        let page = params.effective_page();

        let verified = |supplier_id: Uuid| {
            state
                .suppliers
                .iter()
                .any(|s| s.id == supplier_id && s.is_verified_supplier)
        };

        let mut matching: Vec<&StoredProduct> = state
            .products
            .iter()
            .filter(|p| {
                let d = &p.draft;
                d.status_id == Status::ACTIVE_ID
                    && d.unit_price >= params.min_price
                    && (!params.has_max_price() || d.unit_price <= params.max_price)
                    && params.name.as_ref().map_or(true, |n| &d.name == n)
                    && (params.brand_ids.is_empty() || params.brand_ids.contains(&d.brand_id))
                    && params.category_id.map_or(true, |c| d.category_id == c)
                    && params.supplier_id.map_or(true, |s| d.supplier_id == s)
                    && (!params.is_verified_supplier || verified(d.supplier_id))
            })
            .collect();
        matching.sort_by(|a, b| {
            a.draft
                .unit_price
                .cmp(&b.draft.unit_price)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let products = paginate(matching, PageRequest::new(page, params.limit))
            .into_iter()
            .map(|p| state.hydrate(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage {
            products,
            total,
            page,
            limit: params.limit,
        })
    }

    fn update(&self, id: Uuid, draft: &ProductDraft) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        state.check_references(draft)?;
        match state.products.iter_mut().find(|p| p.id == id) {
            Some(stored) => {
                stored.draft = draft.clone();
                stored.stock_updated_at = now_millis();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut state = self.lock()?;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() < before)
    }

    fn count_referencing(&self, target: ProductRef) -> Result<i64, DbError> {
        let state = self.lock()?;
        Ok(state.products.iter().filter(|p| p.references(target)).count() as i64)
    }

    fn name_taken(&self, supplier_id: Uuid, name: &str, exclude: Option<Uuid>) -> Result<bool, DbError> {
        let state = self.lock()?;
        Ok(state.products.iter().any(|p| {
            p.draft.supplier_id == supplier_id
                && p.draft.name == name
                && p.draft.status_id == Status::ACTIVE_ID
                && Some(p.id) != exclude
        }))
    }
}
