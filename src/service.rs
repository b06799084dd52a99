//! Business rules over the repositories.
//!
//! The HTTP layer validates shapes and ranges; this layer checks everything
//! that needs stored state: referenced records exist, deletes do not orphan
//! products or child categories, category re-parenting never creates a loop,
//! and product names stay unique per supplier.

use crate::error::ServiceError;
use crate::model::{
    Brand, BrandDraft, BrandPage, Category, CategoryDraft, CategoryPage, FilterProductsParams,
    PageRequest, Product, ProductDraft, ProductPage, Supplier, SupplierDraft, SupplierPage,
};
use crate::repo::{ProductRef, Repositories};
use crate::tree::{self, CategoryView, SiblingOrder};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Where an updated category should hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentChange {
    #[default]
    Keep,
    Root,
    To(Uuid),
}

/// A partial category update. `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub name: String,
    pub status_id: Option<i32>,
    pub sequence: Option<i32>,
    pub parent: ParentChange,
}

#[derive(Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // ---- brands ----

    pub fn add_brand(&self, draft: &BrandDraft) -> ServiceResult<Brand> {
        Ok(self.repos.brands.add(draft)?)
    }

    pub fn get_brand(&self, id: Uuid) -> ServiceResult<Brand> {
        self.repos
            .brands
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound("Brand Not Found".to_string()))
    }

    pub fn list_brands(&self, page: PageRequest) -> ServiceResult<BrandPage> {
        Ok(self.repos.brands.list(page)?)
    }

    pub fn update_brand(&self, id: Uuid, draft: &BrandDraft) -> ServiceResult<()> {
        if !self.repos.brands.update(id, draft)? {
            return Err(ServiceError::NotFound("Brand Not Found".to_string()));
        }
        Ok(())
    }

    pub fn delete_brand(&self, id: Uuid) -> ServiceResult<()> {
        self.get_brand(id)?;
        let used_by = self.repos.products.count_referencing(ProductRef::Brand(id))?;
        if used_by > 0 {
            return Err(ServiceError::Conflict(format!(
                "Brand is used by {used_by} product(s)"
            )));
        }
        self.repos.brands.delete(id)?;
        Ok(())
    }

    // ---- categories ----

    pub fn add_category(&self, draft: &CategoryDraft) -> ServiceResult<Category> {
        if let Some(parent_id) = draft.parent_id {
            if self.repos.categories.get(parent_id)?.is_none() {
                return Err(ServiceError::InvalidReference(
                    "Parent category not found".to_string(),
                ));
            }
        }
        Ok(self.repos.categories.add(draft)?)
    }

    pub fn get_category(&self, id: Uuid) -> ServiceResult<Category> {
        self.repos
            .categories
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound("Category Not Found".to_string()))
    }

    pub fn list_categories(&self, page: PageRequest) -> ServiceResult<CategoryPage> {
        Ok(self.repos.categories.list(page)?)
    }

    pub fn update_category(&self, id: Uuid, update: &CategoryUpdate) -> ServiceResult<()> {
        let current = self.get_category(id)?;
        let mut draft = CategoryDraft::from(&current);
        draft.name = update.name.clone();
        if let Some(status_id) = update.status_id {
            draft.status_id = status_id;
        }
        if update.sequence.is_some() {
            draft.sequence = update.sequence;
        }

        match update.parent {
            ParentChange::Keep => {}
            ParentChange::Root => draft.parent_id = None,
            ParentChange::To(parent_id) => {
                if parent_id == id {
                    return Err(ServiceError::Validation(
                        "A category cannot be its own parent".to_string(),
                    ));
                }
                if self.repos.categories.get(parent_id)?.is_none() {
                    return Err(ServiceError::InvalidReference(
                        "Parent category not found".to_string(),
                    ));
                }
                let all = self.repos.categories.list_all()?;
                if tree::is_descendant(&all, id, parent_id) {
                    return Err(ServiceError::Validation(
                        "A category cannot be moved under its own descendant".to_string(),
                    ));
                }
                draft.parent_id = Some(parent_id);
            }
        }

        if !self.repos.categories.update(id, &draft)? {
            return Err(ServiceError::NotFound("Category Not Found".to_string()));
        }
        Ok(())
    }

    pub fn delete_category(&self, id: Uuid) -> ServiceResult<()> {
        self.get_category(id)?;
        let children = self.repos.categories.count_children(id)?;
        if children > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category has {children} child categories"
            )));
        }
        let used_by = self
            .repos
            .products
            .count_referencing(ProductRef::Category(id))?;
        if used_by > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category is used by {used_by} product(s)"
            )));
        }
        self.repos.categories.delete(id)?;
        Ok(())
    }

    /// Full hierarchy from a fresh read of every category.
    pub fn category_tree(&self, order: SiblingOrder) -> ServiceResult<Vec<CategoryView>> {
        let categories = self.repos.categories.list_all()?;

        let unreachable = tree::unreachable_categories(&categories);
        if !unreachable.is_empty() {
            let ids: Vec<String> = unreachable.iter().map(|c| c.id.to_string()).collect();
            log::warn!(
                "{} categories are not reachable from any root: {}",
                ids.len(),
                ids.join(", ")
            );
        }

        let nodes = tree::build_subtree(&categories, None, order).map_err(|e| {
            log::error!("cannot build category tree: {}", e);
            ServiceError::from(e)
        })?;
        Ok(tree::to_view(&nodes))
    }

    // ---- suppliers ----

    pub fn add_supplier(&self, draft: &SupplierDraft) -> ServiceResult<Supplier> {
        Ok(self.repos.suppliers.add(draft)?)
    }

    pub fn get_supplier(&self, id: Uuid) -> ServiceResult<Supplier> {
        self.repos
            .suppliers
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound("Supplier Not Found".to_string()))
    }

    pub fn list_suppliers(&self, page: PageRequest) -> ServiceResult<SupplierPage> {
        Ok(self.repos.suppliers.list(page)?)
    }

    pub fn update_supplier(&self, id: Uuid, draft: &SupplierDraft) -> ServiceResult<()> {
        if !self.repos.suppliers.update(id, draft)? {
            return Err(ServiceError::NotFound("Supplier Not Found".to_string()));
        }
        Ok(())
    }

    pub fn delete_supplier(&self, id: Uuid) -> ServiceResult<()> {
        self.get_supplier(id)?;
        let used_by = self
            .repos
            .products
            .count_referencing(ProductRef::Supplier(id))?;
        if used_by > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier is used by {used_by} product(s)"
            )));
        }
        self.repos.suppliers.delete(id)?;
        Ok(())
    }

    // ---- products ----

    fn check_product(&self, draft: &ProductDraft, own_id: Option<Uuid>) -> ServiceResult<()> {
        if self.repos.suppliers.get(draft.supplier_id)?.is_none() {
            return Err(ServiceError::InvalidReference("Supplier not found".to_string()));
        }
        if self.repos.categories.get(draft.category_id)?.is_none() {
            return Err(ServiceError::InvalidReference("Category not found".to_string()));
        }
        if self.repos.brands.get(draft.brand_id)?.is_none() {
            return Err(ServiceError::InvalidReference("Brand not found".to_string()));
        }
        if self
            .repos
            .products
            .name_taken(draft.supplier_id, &draft.name, own_id)?
        {
            return Err(ServiceError::Validation(
                "Product name already exists for this supplier".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_product(&self, draft: &ProductDraft) -> ServiceResult<Product> {
        self.check_product(draft, None)?;
        Ok(self.repos.products.add(draft)?)
    }

    pub fn get_product(&self, id: Uuid) -> ServiceResult<Product> {
        self.repos
            .products
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound("Product Not Found".to_string()))
    }

    pub fn list_products(&self, params: &FilterProductsParams) -> ServiceResult<ProductPage> {
        Ok(self.repos.products.filter(params)?)
    }

    pub fn update_product(&self, id: Uuid, draft: &ProductDraft) -> ServiceResult<()> {
        self.get_product(id)?;
        self.check_product(draft, Some(id))?;
        if !self.repos.products.update(id, draft)? {
            return Err(ServiceError::NotFound("Product Not Found".to_string()));
        }
        Ok(())
    }

    pub fn delete_product(&self, id: Uuid) -> ServiceResult<()> {
        if !self.repos.products.delete(id)? {
            return Err(ServiceError::NotFound("Product Not Found".to_string()));
        }
        Ok(())
    }
}
