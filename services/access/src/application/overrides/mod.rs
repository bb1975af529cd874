//! 个别授权管理

pub mod commands;
pub mod handlers;
pub mod queries;
pub mod query_handlers;

pub use commands::*;
pub use handlers::OverrideCommandHandler;
pub use queries::*;
pub use query_handlers::OverrideQueryHandler;
