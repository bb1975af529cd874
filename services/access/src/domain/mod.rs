//! 领域层

pub mod identity;
pub mod permission;

pub use identity::IdentityProvider;
