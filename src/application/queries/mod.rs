//! 应用层 - 查询（读操作）

mod speaker_queries;

pub use speaker_queries::*;
