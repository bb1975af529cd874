//! 基础设施层

pub mod health;
pub mod identity;
pub mod persistence;

pub use health::{HealthProbe, PostgresHealthProbe};
pub use identity::{BearerIdentity, FixedIdentity};
