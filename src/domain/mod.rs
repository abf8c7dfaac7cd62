//! Domain Layer - 领域层
//!
//! Speaker Context: 说话人记录、名称与参考音频

pub mod speaker;
