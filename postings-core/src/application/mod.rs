pub mod posting_service;
pub mod user_service;
