//! Speaker Commands

use std::collections::BTreeMap;

use crate::domain::speaker::{AudioSample, PropertyValue};

/// 注册说话人命令
#[derive(Debug, Clone, Default)]
pub struct RegisterSpeaker {
    pub name: String,
    /// 初始参考音频，必填
    pub audio: Option<AudioSample>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub extra_properties: BTreeMap<String, PropertyValue>,
}

/// 更新说话人命令（部分更新）
#[derive(Debug, Clone, Default)]
pub struct UpdateSpeaker {
    pub name: String,
    /// 为 None 时保留原音频
    pub audio: Option<AudioSample>,
    /// 为 None 时保持不变，空白字符串表示清空
    pub language: Option<String>,
    pub description: Option<String>,
    /// 按键覆盖，未提供的键保持不变
    pub extra_properties: BTreeMap<String, PropertyValue>,
}

/// 删除说话人命令
#[derive(Debug, Clone)]
pub struct DeleteSpeaker {
    pub name: String,
}
