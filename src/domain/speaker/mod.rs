//! Speaker Context - 说话人限界上下文
//!
//! 职责:
//! - 参考音频样本描述
//! - 说话人元数据与扩展属性
//! - 名称与样本的校验规则

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::{SpeakerPatch, SpeakerRecord};
pub use errors::SpeakerError;
pub use value_objects::{AudioFormat, AudioSample, PropertyValue, SpeakerName};
