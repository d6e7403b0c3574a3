pub mod memory_user_repository;
pub mod user_repository;
