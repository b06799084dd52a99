//! Service-level errors and their HTTP status mapping.

use crate::executor::DbError;
use crate::tree::TreeError;
use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    /// Request data failed a business or format rule
    Validation(String),
    /// A referenced record (parent, brand, category, supplier) does not exist
    InvalidReference(String),
    /// The addressed record does not exist
    NotFound(String),
    /// The write would break a reference held by other records
    Conflict(String),
    /// Stored data is inconsistent (e.g. a category cycle)
    Integrity(String),
    Database(DbError),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidReference(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Integrity(_) | ServiceError::Database(_) => 500,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(s) => write!(f, "{s}"),
            ServiceError::InvalidReference(s) => write!(f, "{s}"),
            ServiceError::NotFound(s) => write!(f, "{s}"),
            ServiceError::Conflict(s) => write!(f, "{s}"),
            ServiceError::Integrity(s) => write!(f, "Integrity error: {s}"),
            ServiceError::Database(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::Database(err)
    }
}

impl From<TreeError> for ServiceError {
    fn from(err: TreeError) -> Self {
        ServiceError::Integrity(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::Validation("x".into()).status_code(), 400);
        assert_eq!(ServiceError::InvalidReference("x".into()).status_code(), 400);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ServiceError::Database(DbError::Pool("x".into())).status_code(), 500);
    }

    #[test]
    fn test_cycle_becomes_integrity_error() {
        let err: ServiceError = TreeError::Cycle { id: Uuid::nil() }.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("cycle"));
    }
}
