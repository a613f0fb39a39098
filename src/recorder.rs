//! Voice sample recorder.
//!
//! Collects samples from an [`AudioCapture`], then submits all of them in a
//! single clone request. A failed upload keeps everything so the user can
//! retry. A successful one clears the samples and the name.

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{error, info};

use crate::api::{encode_sample, CloneRequest, ServiceError, VoiceService};
use crate::capture::{AudioCapture, CaptureError};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Error accessing microphone. Please ensure you have granted permission.")]
    Microphone(#[source] CaptureError),

    #[error("Error finishing recording. Please try again.")]
    Capture(#[source] CaptureError),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Please record at least one voice sample")]
    NoRecordings,

    #[error("Please enter a name for your voice")]
    MissingVoiceName,

    #[error("Error creating voice. Please try again.")]
    Upload(#[source] ServiceError),
}

#[derive(Debug, Clone)]
pub struct Recording {
    /// WAV bytes, playable as-is.
    pub audio: Vec<u8>,
    pub duration_secs: f64,
    pub created_at: DateTime<Local>,
}

pub struct VoiceRecorder {
    capture: Box<dyn AudioCapture>,
    recordings: Vec<Recording>,
    voice_name: String,
}

impl VoiceRecorder {
    pub fn new(capture: Box<dyn AudioCapture>) -> Self {
        Self {
            capture,
            recordings: Vec::new(),
            voice_name: String::new(),
        }
    }

    pub fn start_recording(&mut self) -> Result<(), RecorderError> {
        if self.capture.is_capturing() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.capture.start().map_err(|e| {
            error!("Error accessing microphone: {e}");
            RecorderError::Microphone(e)
        })
    }

    /// Finish the current sample and append it.
    pub fn stop_recording(&mut self) -> Result<&Recording, RecorderError> {
        if !self.capture.is_capturing() {
            return Err(RecorderError::NotRecording);
        }
        let captured = self.capture.stop().map_err(|e| {
            error!("Error finishing recording: {e}");
            RecorderError::Capture(e)
        })?;

        self.recordings.push(Recording {
            audio: captured.wav,
            duration_secs: captured.duration_secs,
            created_at: Local::now(),
        });
        info!("Recording {} added ({:.1}s)", self.recordings.len(), captured.duration_secs);

        Ok(&self.recordings[self.recordings.len() - 1])
    }

    pub fn set_voice_name(&mut self, name: &str) {
        self.voice_name = name.to_string();
    }

    pub fn voice_name(&self) -> &str {
        &self.voice_name
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn recording(&self, index: usize) -> Option<&Recording> {
        self.recordings.get(index)
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_capturing()
    }

    /// Send every sample to the cloning service and return the new voice id.
    pub async fn upload_recordings(
        &mut self,
        service: &dyn VoiceService,
    ) -> Result<String, RecorderError> {
        if self.recordings.is_empty() {
            return Err(RecorderError::NoRecordings);
        }
        if self.voice_name.is_empty() {
            return Err(RecorderError::MissingVoiceName);
        }

        let request = CloneRequest {
            voice_name: self.voice_name.clone(),
            voice_samples: self.recordings.iter().map(|r| encode_sample(&r.audio)).collect(),
        };

        match service.clone_voice(&request).await {
            Ok(voice_id) => {
                info!("Voice '{}' created: {voice_id}", self.voice_name);
                self.recordings.clear();
                self.voice_name.clear();
                Ok(voice_id)
            }
            Err(e) => {
                error!("Error uploading recordings: {e}");
                Err(RecorderError::Upload(e))
            }
        }
    }
}
