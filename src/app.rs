//! Wires the recorder and the speech panel to one voice service.
//!
//! The active voice id lives here: the recorder hands it up after a clone,
//! and the panel receives it with every synthesis request.

use std::sync::Arc;

use tracing::info;

use crate::api::VoiceService;
use crate::panel::{GeneratedAudio, PanelError, SpeechPanel};
use crate::player::PlaybackError;
use crate::recorder::{RecorderError, VoiceRecorder};

pub struct App {
    service: Arc<dyn VoiceService>,
    recorder: VoiceRecorder,
    panel: SpeechPanel,
    voice_id: Option<String>,
}

impl App {
    pub fn new(
        service: Arc<dyn VoiceService>,
        recorder: VoiceRecorder,
        panel: SpeechPanel,
    ) -> Self {
        Self {
            service,
            recorder,
            panel,
            voice_id: None,
        }
    }

    /// Start with a voice created in an earlier session.
    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }

    pub fn recorder(&self) -> &VoiceRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut VoiceRecorder {
        &mut self.recorder
    }

    pub fn panel(&self) -> &SpeechPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut SpeechPanel {
        &mut self.panel
    }

    /// Upload the recorded samples and adopt the returned voice.
    pub async fn create_voice(&mut self) -> Result<&str, RecorderError> {
        let voice_id = self.recorder.upload_recordings(self.service.as_ref()).await?;
        if let Some(previous) = &self.voice_id {
            info!("Replacing voice {previous} with {voice_id}");
        }
        Ok(self.voice_id.insert(voice_id).as_str())
    }

    pub async fn generate_speech(&mut self) -> Result<&GeneratedAudio, PanelError> {
        self.panel
            .generate_speech(self.voice_id.as_deref(), self.service.as_ref())
            .await
    }

    /// Play recorded sample `index` through the panel's output.
    pub fn play_recording(&mut self, index: usize) -> Result<bool, PlaybackError> {
        let Some(recording) = self.recorder.recording(index) else {
            return Ok(false);
        };
        self.panel.play_clip(&recording.audio)?;
        Ok(true)
    }
}
