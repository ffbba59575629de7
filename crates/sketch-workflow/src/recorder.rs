//! Audio capture behind the `AudioRecorder` seam.
//!
//! `MicRecorder` captures from the default CPAL input device; the samples
//! are encoded to 16-bit mono WAV when the clip is taken. `ScriptedRecorder`
//! is the test double, including the capture mechanism's quirk of the clip
//! not being available immediately after stop.

use crate::error::{WorkflowError, WorkflowResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// One captured recording: raw bytes plus the content type the gateway's
/// multipart upload will carry.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

/// Capture seam. Start/stop are user actions; `take_clip` consumes the
/// recording once it has materialized (may lag a stop — the workflow polls).
pub trait AudioRecorder {
    fn start(&mut self) -> WorkflowResult<()>;
    fn stop(&mut self);
    fn take_clip(&mut self) -> Option<AudioClip>;
}

/// Recorder configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Sample rate in Hz (default: 16000)
    pub sample_rate: u32,
    /// Number of channels (default: 1 for mono)
    pub channels: u16,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Encode f32 PCM to 16-bit WAV bytes for the multipart upload.
fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * channels as u32 * 2;
    let block_align = channels * 2;

    let mut buf = Vec::with_capacity(44 + data_len as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let i = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf
}

/// Microphone capture via the default CPAL input device.
pub struct MicRecorder {
    config: RecorderConfig,
    samples: Arc<Mutex<Vec<f32>>>,
    // Dropping the stream stops capture.
    stream: Option<cpal::Stream>,
}

impl MicRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        }
    }
}

impl Default for MicRecorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl AudioRecorder for MicRecorder {
    fn start(&mut self) -> WorkflowResult<()> {
        if self.stream.is_some() {
            warn!("recorder already running; ignoring start");
            return Ok(());
        }
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| WorkflowError::AudioDevice("No input device available".to_string()))?;
        info!(
            "recording from input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
        let sink = Arc::clone(&self.samples);
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = sink.lock() {
                    samples.extend_from_slice(data);
                }
            },
            move |err| {
                warn!("audio stream error: {}", err);
            },
            None,
        )?;
        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        // Drop ends the CPAL stream and flushes its callback.
        self.stream = None;
    }

    fn take_clip(&mut self) -> Option<AudioClip> {
        let mut samples = self.samples.lock().ok()?;
        if samples.is_empty() {
            return None;
        }
        let pcm: Vec<f32> = samples.drain(..).collect();
        drop(samples);
        Some(AudioClip {
            bytes: encode_wav(&pcm, self.config.sample_rate, self.config.channels),
            mime_type: "audio/wav".to_string(),
            file_name: "recording.wav".to_string(),
        })
    }
}

/// Scripted recorder for tests: returns the configured clip only after
/// `polls_until_ready` calls to `take_clip`, or never if no clip is set.
#[derive(Debug, Default)]
pub struct ScriptedRecorder {
    pub clip: Option<AudioClip>,
    pub polls_until_ready: u32,
    polls: u32,
    pub started: bool,
    pub stopped: bool,
}

impl ScriptedRecorder {
    pub fn with_clip(clip: AudioClip) -> Self {
        Self {
            clip: Some(clip),
            ..Self::default()
        }
    }

    /// A recorder that never produces a clip.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl AudioRecorder for ScriptedRecorder {
    fn start(&mut self) -> WorkflowResult<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn take_clip(&mut self) -> Option<AudioClip> {
        self.polls += 1;
        if self.polls <= self.polls_until_ready {
            return None;
        }
        self.clip.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_describes_the_payload() {
        let wav = encode_wav(&[0.0, 0.5, -0.5, 1.0], 16000, 1);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 8);
        // data subchunk length
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
    }

    #[test]
    fn full_scale_samples_clamp() {
        let wav = encode_wav(&[2.0, -2.0], 16000, 1);
        let hi = i16::from_le_bytes(wav[44..46].try_into().unwrap());
        let lo = i16::from_le_bytes(wav[46..48].try_into().unwrap());
        assert_eq!(hi, 32767);
        assert_eq!(lo, -32767);
    }

    #[test]
    fn scripted_recorder_delays_availability() {
        let clip = AudioClip {
            bytes: vec![1, 2, 3],
            mime_type: "audio/webm".to_string(),
            file_name: "recording.webm".to_string(),
        };
        let mut rec = ScriptedRecorder::with_clip(clip);
        rec.polls_until_ready = 2;
        assert!(rec.take_clip().is_none());
        assert!(rec.take_clip().is_none());
        assert!(rec.take_clip().is_some());
        assert!(rec.take_clip().is_none());
    }
}
