//! Audio Adapter - 参考音频探测

mod symphonia_inspector;

pub use symphonia_inspector::SymphoniaAudioInspector;
