//! 应用层

pub mod gate;
pub mod overrides;
pub mod resolver;

pub use gate::AccessGate;
pub use resolver::PermissionResolver;
