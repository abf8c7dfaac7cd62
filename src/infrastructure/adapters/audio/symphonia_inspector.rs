//! Symphonia Audio Inspector - 基于 symphonia 的样本校验
//!
//! 只探测容器并读取第一个数据包，不做完整解码

use std::io::Cursor;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, AudioInspectorPort, InspectError};
use crate::domain::speaker::AudioSample;

/// Symphonia 音频探测器
#[derive(Debug, Default, Clone)]
pub struct SymphoniaAudioInspector;

impl SymphoniaAudioInspector {
    pub fn new() -> Self {
        Self
    }
}

impl AudioInspectorPort for SymphoniaAudioInspector {
    fn inspect(&self, sample: &AudioSample) -> Result<AudioInfo, InspectError> {
        let cursor = Cursor::new(sample.data().to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(sample.format().extension());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| InspectError::Unreadable(format!("probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(InspectError::NoAudioTrack)?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        if params.n_frames == Some(0) {
            return Err(InspectError::Unreadable(
                "audio stream contains no frames".to_string(),
            ));
        }

        // 至少能读出一个属于该轨道的数据包
        loop {
            match format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => break,
                Ok(_) => continue,
                Err(SymphoniaError::IoError(_)) => {
                    return Err(InspectError::Unreadable(
                        "audio stream ended before the first packet".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(InspectError::Unreadable(format!("read failed: {}", e)));
                }
            }
        }

        let duration_ms = match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames * 1000 / rate as u64),
            _ => None,
        };

        Ok(AudioInfo {
            format: sample.format(),
            sample_rate: params.sample_rate,
            channels: params.channels.map(|c| c.count()),
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speaker::AudioFormat;
    use crate::test_support::wav_sample;

    #[test]
    fn test_inspect_wav() {
        let info = SymphoniaAudioInspector::new()
            .inspect(&wav_sample(5))
            .unwrap();
        assert_eq!(info.format, AudioFormat::Wav);
        assert_eq!(info.sample_rate, Some(16_000));
        assert_eq!(info.channels, Some(1));
        assert_eq!(info.duration_ms, Some(5000));
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let sample = AudioSample::new(vec![0x42; 4096], AudioFormat::Wav);
        assert!(SymphoniaAudioInspector::new().inspect(&sample).is_err());
    }
}
