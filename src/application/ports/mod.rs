pub mod auth_handler;
pub mod session_lookup;
pub mod session_repository;
pub mod store_health;
pub mod user_repository;
