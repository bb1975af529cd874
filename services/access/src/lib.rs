//! SunLease 访问控制服务
//!
//! 权限目录、权限解析与访问门禁，以及个别授权的管理接口。

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
