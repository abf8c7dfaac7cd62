//! Speaker Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{PropertyValue, SpeakerName};

/// 说话人记录（聚合根）
///
/// 不变量:
/// - 每条记录有且只有一个由注册表管理的参考音频
/// - created_at 创建后不可变，updated_at 不早于 created_at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerRecord {
    name: SpeakerName,
    audio_path: PathBuf,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    extra_properties: BTreeMap<String, PropertyValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 部分更新
///
/// `None` 表示不修改；`Some` 中的空白字符串表示清空该字段。
/// extra_properties 按键合并，未出现的键保持不变。
#[derive(Debug, Clone, Default)]
pub struct SpeakerPatch {
    pub audio_path: Option<PathBuf>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub extra_properties: BTreeMap<String, PropertyValue>,
}

impl SpeakerRecord {
    /// 创建新记录，created_at == updated_at == now
    pub fn new(name: SpeakerName, audio_path: PathBuf, now: DateTime<Utc>) -> Self {
        Self {
            name,
            audio_path,
            language: None,
            description: None,
            extra_properties: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = normalize(language);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = normalize(description);
        self
    }

    pub fn with_extra_properties(mut self, properties: BTreeMap<String, PropertyValue>) -> Self {
        self.extra_properties = properties;
        self
    }

    /// 应用部分更新并刷新 updated_at
    pub fn apply(&mut self, patch: SpeakerPatch, now: DateTime<Utc>) {
        if let Some(path) = patch.audio_path {
            self.audio_path = path;
        }
        if let Some(language) = patch.language {
            self.language = normalize(Some(language));
        }
        if let Some(description) = patch.description {
            self.description = normalize(Some(description));
        }
        self.extra_properties.extend(patch.extra_properties);
        self.updated_at = now.max(self.created_at);
    }

    /// 替换参考音频路径（启动修复时使用，不视为一次更新）
    pub fn relocate_audio(&mut self, path: PathBuf) {
        self.audio_path = path;
    }

    // Getters
    pub fn name(&self) -> &SpeakerName {
        &self.name
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn extra_properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.extra_properties
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> SpeakerRecord {
        let name = SpeakerName::new("joana").unwrap();
        SpeakerRecord::new(name, PathBuf::from("/tmp/joana.wav"), Utc::now())
            .with_language(Some("pt".to_string()))
            .with_description(Some("demo".to_string()))
    }

    #[test]
    fn test_new_record_timestamps_match() {
        let record = record();
        assert_eq!(record.created_at(), record.updated_at());
        assert_eq!(record.language(), Some("pt"));
        assert_eq!(record.description(), Some("demo"));
        assert!(record.extra_properties().is_empty());
    }

    #[test]
    fn test_patch_leaves_untouched_fields() {
        let mut record = record();
        let created = record.created_at();
        record.apply(
            SpeakerPatch {
                description: Some("nova".to_string()),
                ..Default::default()
            },
            created + Duration::seconds(5),
        );

        assert_eq!(record.language(), Some("pt"));
        assert_eq!(record.description(), Some("nova"));
        assert_eq!(record.audio_path(), Path::new("/tmp/joana.wav"));
        assert_eq!(record.created_at(), created);
        assert_eq!(record.updated_at(), created + Duration::seconds(5));
    }

    #[test]
    fn test_patch_blank_clears_field() {
        let mut record = record();
        record.apply(
            SpeakerPatch {
                language: Some("  ".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(record.language(), None);
        assert_eq!(record.description(), Some("demo"));
    }

    #[test]
    fn test_patch_merges_properties() {
        let mut record = record().with_extra_properties(BTreeMap::from([
            ("age".to_string(), PropertyValue::from(30_i64)),
            ("accent".to_string(), PropertyValue::from("porto")),
        ]));
        record.apply(
            SpeakerPatch {
                extra_properties: BTreeMap::from([(
                    "accent".to_string(),
                    PropertyValue::from("lisboa"),
                )]),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(record.extra_properties()["age"], PropertyValue::from(30_i64));
        assert_eq!(record.extra_properties()["accent"], PropertyValue::from("lisboa"));
    }

    #[test]
    fn test_updated_at_never_precedes_created_at() {
        let mut record = record();
        let created = record.created_at();
        record.apply(SpeakerPatch::default(), created - Duration::hours(1));
        assert_eq!(record.updated_at(), created);
    }

    #[test]
    fn test_record_json_shape() {
        let record = record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "joana");
        assert_eq!(json["language"], "pt");
        assert!(json["extra_properties"].as_object().unwrap().is_empty());

        let back: SpeakerRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
