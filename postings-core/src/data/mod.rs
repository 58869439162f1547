pub mod posting_query;
pub mod posting_repository;
pub mod user_repository;
