//! Speaker Queries

/// 获取说话人详情查询
#[derive(Debug, Clone)]
pub struct GetSpeaker {
    pub name: String,
}

/// 列出所有说话人查询
#[derive(Debug, Clone)]
pub struct ListSpeakers;
