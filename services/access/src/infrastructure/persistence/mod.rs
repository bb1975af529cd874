//! 持久化层模块

pub mod db_metrics;
pub mod migrations;
pub mod override_repository;
pub mod permission_source;

pub use migrations::run_migrations;
pub use override_repository::PostgresOverrideRepository;
pub use permission_source::PostgresPermissionSource;
