//! 个别授权查询定义

/// 列出用户个别授权查询
#[derive(Debug, Clone)]
pub struct ListOverridesQuery {
    pub user_id: String,
}
