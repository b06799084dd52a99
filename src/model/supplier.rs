use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status_id: i32,
    pub is_verified_supplier: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplierDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status_id: i32,
    pub is_verified_supplier: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierPage {
    pub suppliers: Vec<Supplier>,
    pub total: i64,
    pub page: u64,
    pub limit: u64,
}
