//! Catalog domain types.
//!
//! Records as stored and served (`Brand`, `Category`, `Supplier`, `Product`,
//! `ProductStock`), the drafts the service hands to repositories for writes,
//! and the paged result wrappers.

pub mod brand;
pub mod category;
pub mod product;
pub mod supplier;

pub use brand::{Brand, BrandDraft, BrandPage};
pub use category::{Category, CategoryDraft, CategoryPage};
pub use product::{FilterProductsParams, Product, ProductDraft, ProductPage, ProductStock};
pub use supplier::{Supplier, SupplierDraft, SupplierPage};

use serde::{Deserialize, Serialize};

/// Record status. Stored as `status_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub const ACTIVE_ID: i32 = 1;
    pub const INACTIVE_ID: i32 = 2;

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            Self::ACTIVE_ID => Some(Status::Active),
            Self::INACTIVE_ID => Some(Status::Inactive),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Status::Active => Self::ACTIVE_ID,
            Status::Inactive => Self::INACTIVE_ID,
        }
    }
}

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `page`/`limit` pair for list endpoints. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Rows to skip. Page 0 is treated as page 1.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ids() {
        assert_eq!(Status::from_id(1), Some(Status::Active));
        assert_eq!(Status::from_id(2), Some(Status::Inactive));
        assert_eq!(Status::from_id(0), None);
        assert_eq!(Status::from_id(3), None);
        assert_eq!(Status::Inactive.id(), 2);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
    }

    #[test]
    fn test_now_millis_is_milliseconds() {
        // 2020-01-01 in ms; seconds would be three orders of magnitude smaller
        assert!(now_millis() > 1_577_836_800_000);
    }
}
