use thiserror::Error;
use uuid::Uuid;

use crate::domain::category::ParseCategoryError;
use crate::infrastructure::storage::StorageError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("posting not found: {0}")]
    PostingNotFound(Uuid),
    #[error("forbidden")]
    Forbidden,
    #[error("stored row holds an invalid category: {0}")]
    InvalidCategory(#[from] ParseCategoryError),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        match self {
            DomainError::UserNotFound(_) | DomainError::PostingNotFound(_) => true,
            DomainError::Storage(err) => err.is_not_found(),
            _ => false,
        }
    }
}
