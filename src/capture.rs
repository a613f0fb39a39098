//! Microphone capture with cpal.
//!
//! The input stream only exists between `start` and `stop`, so the device is
//! released as soon as a sample is finished. Samples come back as 16-bit PCM
//! WAV bytes, ready to upload or play.

use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AudioConfig;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input audio device available")]
    NoDevice,

    #[error("input device {0} not found")]
    DeviceNotFound(usize),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query input config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("capture is not running")]
    NotCapturing,

    #[error("failed to encode WAV: {0}")]
    Encode(#[from] hound::Error),
}

/// A finished sample.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub wav: Vec<u8>,
    pub duration_secs: f64,
}

/// Source of recorded audio.
pub trait AudioCapture {
    fn start(&mut self) -> Result<(), CaptureError>;
    /// Finish the sample and release the device.
    fn stop(&mut self) -> Result<CapturedAudio, CaptureError>;
    fn is_capturing(&self) -> bool;
}

struct CaptureBuffer {
    samples: Vec<f32>,
    max_samples: usize,
}

impl CaptureBuffer {
    fn push(&mut self, data: impl Iterator<Item = f32>) {
        let remaining = self.max_samples.saturating_sub(self.samples.len());
        if remaining == 0 {
            return;
        }
        self.samples.extend(data.take(remaining));
        if self.samples.len() >= self.max_samples {
            warn!("Max recording duration reached, further audio is dropped");
        }
    }
}

struct ActiveStream {
    // Dropping the stream closes the device.
    _stream: Stream,
    sample_rate: u32,
    channels: u16,
}

pub struct MicrophoneCapture {
    config: AudioConfig,
    buffer: Arc<Mutex<CaptureBuffer>>,
    active: Option<ActiveStream>,
}

impl MicrophoneCapture {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            buffer: Arc::new(Mutex::new(CaptureBuffer {
                samples: Vec::new(),
                max_samples: 0,
            })),
            active: None,
        }
    }

    fn input_device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        match self.config.device_index {
            Some(index) => host
                .input_devices()?
                .nth(index)
                .ok_or(CaptureError::DeviceNotFound(index)),
            None => host.default_input_device().ok_or(CaptureError::NoDevice),
        }
    }
}

impl AudioCapture for MicrophoneCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Ok(());
        }

        let device = self.input_device()?;
        info!(
            "Using audio device: {}",
            device.name().unwrap_or("unknown".into())
        );

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels;

        {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            buffer.samples.clear();
            buffer.max_samples =
                (self.config.max_duration * sample_rate as f64) as usize * channels as usize;
        }

        let err_fn = |err: cpal::StreamError| warn!("Audio stream error: {err}");
        let stream = match sample_format {
            SampleFormat::F32 => {
                let buffer = Arc::clone(&self.buffer);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                        let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                        buffer.push(data.iter().copied());
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let buffer = Arc::clone(&self.buffer);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _info: &cpal::InputCallbackInfo| {
                        let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                        buffer.push(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(CaptureError::UnsupportedFormat(other)),
        };

        stream.play()?;
        info!("Recording started ({sample_rate} Hz, {channels} ch)");

        self.active = Some(ActiveStream {
            _stream: stream,
            sample_rate,
            channels,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<CapturedAudio, CaptureError> {
        let active = self.active.take().ok_or(CaptureError::NotCapturing)?;
        let (sample_rate, channels) = (active.sample_rate, active.channels);
        drop(active);

        let samples = {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut buffer.samples)
        };

        let frames = samples.len() / channels.max(1) as usize;
        let duration_secs = frames as f64 / sample_rate as f64;
        info!("Recording stopped: {duration_secs:.1}s ({} samples)", samples.len());

        let wav = encode_wav(&samples, sample_rate, channels)?;
        debug!("Encoded {} bytes of WAV", wav.len());
        Ok(CapturedAudio { wav, duration_secs })
    }

    fn is_capturing(&self) -> bool {
        self.active.is_some()
    }
}

/// Encode interleaved f32 samples as 16-bit PCM WAV.
pub fn encode_wav(
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            // f32 [-1, 1] → i16
            let s = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
