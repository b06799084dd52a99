use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub status_id: i32,
    pub created_at: i64,
}

/// Fields a client supplies when creating or updating a brand.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandDraft {
    pub name: String,
    pub status_id: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandPage {
    pub brands: Vec<Brand>,
    pub total: i64,
    pub page: u64,
    pub limit: u64,
}
