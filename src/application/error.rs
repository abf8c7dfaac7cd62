//! 应用层错误定义
//!
//! 注册表操作的统一错误类型，每个错误都带有操作名和说话人名称

use thiserror::Error;

use crate::application::ports::StorageError;
use crate::domain::speaker::SpeakerError;

/// 注册表操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Register,
    Update,
    Delete,
    Get,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Register => "register",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Get => "get",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    /// 输入不合法（调用方问题，不重试）
    #[error("{operation} failed{}: {message}", for_speaker(.name))]
    Validation {
        operation: Operation,
        name: Option<String>,
        message: String,
    },

    /// 名称已存在
    #[error("{operation} failed: speaker '{name}' already exists")]
    DuplicateName { operation: Operation, name: String },

    /// 说话人不存在
    #[error("{operation} failed: speaker '{name}' not found")]
    NotFound { operation: Operation, name: String },

    /// 持久化失败
    #[error("{operation} failed{}: {source}", for_speaker(.name))]
    Storage {
        operation: Operation,
        name: Option<String>,
        #[source]
        source: StorageError,
    },

    /// 后台执行的变更没有跑完（运行时正在关闭）
    #[error("{operation} failed: interrupted before completion")]
    Interrupted { operation: Operation },
}

fn for_speaker(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" for speaker '{}'", name),
        None => String::new(),
    }
}

impl RegistryError {
    /// 创建验证错误
    pub fn validation(
        operation: Operation,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            operation,
            name: Some(name.into()),
            message: message.into(),
        }
    }

    /// 领域校验失败
    pub fn invalid(operation: Operation, name: impl Into<String>, err: SpeakerError) -> Self {
        Self::validation(operation, name, err.to_string())
    }

    pub fn duplicate(operation: Operation, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            operation,
            name: name.into(),
        }
    }

    pub fn not_found(operation: Operation, name: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            name: name.into(),
        }
    }

    pub fn storage(operation: Operation, name: Option<String>, source: StorageError) -> Self {
        Self::Storage {
            operation,
            name,
            source,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::Validation { operation, .. }
            | Self::DuplicateName { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Storage { operation, .. }
            | Self::Interrupted { operation } => *operation,
        }
    }
}
