pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;

pub use application::posting_service::PostingService;
pub use application::user_service::UserService;
pub use data::posting_repository::{PostgresPostingRepository, PostingRepository};
pub use data::user_repository::{PostgresUserRepository, UserRepository};
pub use domain::error::DomainError;
pub use infrastructure::storage::{FileStorage, LocalFileStorage, StoredFile, UploadedFile};
