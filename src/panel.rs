//! Text-to-speech panel with state machine.
//!
//! IDLE → PREVIEWING → IDLE
//! IDLE → GENERATING → IDLE

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{decode_audio, QuotePosition, ServiceError, SpeechRequest, VoiceService};
use crate::history::{History, HistoryEntry};
use crate::player::{AudioPlayer, PlaybackError};
use crate::preview::{PreviewError, SpeechPreview};

/// Longest text the panel will hold, in characters.
pub const MAX_TEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Previewing,
    Generating,
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Previewing => write!(f, "PREVIEWING"),
            Self::Generating => write!(f, "GENERATING"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Please enter some text")]
    EmptyText,

    #[error("Please create a voice first")]
    MissingVoice,

    #[error("Busy ({0}), please wait")]
    Busy(PanelState),

    #[error("Speech preview is not available.")]
    Preview(#[source] PreviewError),

    #[error("Error generating speech. Please try again.")]
    Synthesis(#[source] ServiceError),
}

/// Audio returned by the synthesis service, decoded.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub audio: Vec<u8>,
    /// What the service says it spoke, quote included.
    pub spoken_text: Option<String>,
}

pub struct SpeechPanel {
    text: String,
    include_quote: bool,
    quote_position: QuotePosition,
    state: PanelState,
    history: History,
    preview: Box<dyn SpeechPreview>,
    player: Box<dyn AudioPlayer>,
    last_audio: Option<GeneratedAudio>,
}

impl SpeechPanel {
    pub fn new(
        history: History,
        preview: Box<dyn SpeechPreview>,
        player: Box<dyn AudioPlayer>,
    ) -> Self {
        Self {
            text: String::new(),
            include_quote: true,
            quote_position: QuotePosition::Start,
            state: PanelState::Idle,
            history,
            preview,
            player,
            last_audio: None,
        }
    }

    pub fn with_quote_defaults(
        mut self,
        include_quote: bool,
        quote_position: QuotePosition,
    ) -> Self {
        self.include_quote = include_quote;
        self.quote_position = quote_position;
        self
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, silently cutting it at [`MAX_TEXT_CHARS`].
    pub fn set_text(&mut self, text: &str) {
        let mut chars = text.char_indices();
        match chars.nth(MAX_TEXT_CHARS) {
            Some((cut, _)) => {
                debug!("Text truncated to {MAX_TEXT_CHARS} characters");
                self.text = text[..cut].to_string();
            }
            None => self.text = text.to_string(),
        }
    }

    pub fn include_quote(&self) -> bool {
        self.include_quote
    }

    pub fn set_include_quote(&mut self, include_quote: bool) {
        self.include_quote = include_quote;
    }

    pub fn quote_position(&self) -> QuotePosition {
        self.quote_position
    }

    pub fn set_quote_position(&mut self, position: QuotePosition) {
        self.quote_position = position;
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    /// Load a past request back into the editable fields.
    pub fn use_history_entry(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index).cloned() else {
            return false;
        };
        self.set_text(&entry.text);
        self.include_quote = entry.include_quote;
        self.quote_position = entry.quote_position;
        true
    }

    pub fn last_audio(&self) -> Option<&GeneratedAudio> {
        self.last_audio.as_ref()
    }

    fn require_text(&self) -> Result<(), PanelError> {
        if self.text.is_empty() {
            return Err(PanelError::EmptyText);
        }
        Ok(())
    }

    fn require_idle(&self) -> Result<(), PanelError> {
        if self.state != PanelState::Idle {
            return Err(PanelError::Busy(self.state));
        }
        Ok(())
    }

    /// Speak the text with the local engine.
    pub fn preview_speech(&mut self) -> Result<(), PanelError> {
        self.require_text()?;
        self.require_idle()?;

        self.preview.start(&self.text).map_err(|e| {
            warn!("Preview failed: {e}");
            PanelError::Preview(e)
        })?;
        self.state = PanelState::Previewing;
        info!("State: IDLE → PREVIEWING");
        Ok(())
    }

    /// Cancel a running preview. Returns `false` if none was running.
    pub fn stop_preview(&mut self) -> bool {
        if self.state != PanelState::Previewing {
            return false;
        }
        self.preview.cancel();
        self.state = PanelState::Idle;
        info!("State: PREVIEWING → IDLE (stopped)");
        true
    }

    /// Notice a preview that finished by itself. Returns `true` on that transition.
    pub fn poll_preview(&mut self) -> bool {
        if self.state == PanelState::Previewing && !self.preview.is_active() {
            self.state = PanelState::Idle;
            info!("State: PREVIEWING → IDLE");
            return true;
        }
        false
    }

    /// Synthesize the text in the cloned voice, play it, and remember it.
    pub async fn generate_speech(
        &mut self,
        voice_id: Option<&str>,
        service: &dyn VoiceService,
    ) -> Result<&GeneratedAudio, PanelError> {
        self.require_text()?;
        let voice_id = match voice_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(PanelError::MissingVoice),
        };
        self.require_idle()?;

        let request = SpeechRequest {
            text: self.text.clone(),
            voice_id: voice_id.to_string(),
            include_quote: self.include_quote,
            quote_position: self.quote_position,
        };

        self.state = PanelState::Generating;
        info!("State: IDLE → GENERATING");
        let result = Self::request_speech(service, &request).await;
        self.state = PanelState::Idle;
        info!("State: GENERATING → IDLE");

        let generated = result.map_err(|e| {
            error!("Error generating speech: {e}");
            PanelError::Synthesis(e)
        })?;

        if let Err(e) = self.player.play(&generated.audio) {
            warn!("Auto-play failed: {e}");
        }
        self.history.record(HistoryEntry::new(
            request.text,
            request.include_quote,
            request.quote_position,
        ));

        Ok(&*self.last_audio.insert(generated))
    }

    async fn request_speech(
        service: &dyn VoiceService,
        request: &SpeechRequest,
    ) -> Result<GeneratedAudio, ServiceError> {
        let payload = service.text_to_speech(request).await?;
        let audio = decode_audio(&payload.audio)?;
        debug!("Received {} bytes of audio", audio.len());
        Ok(GeneratedAudio {
            audio,
            spoken_text: payload.text,
        })
    }

    /// Play the last generated audio again.
    pub fn replay(&mut self) -> Result<bool, PlaybackError> {
        match &self.last_audio {
            Some(generated) => {
                self.player.play(&generated.audio)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Play any clip through the panel's output, e.g. a recorded sample.
    pub fn play_clip(&mut self, audio: &[u8]) -> Result<(), PlaybackError> {
        self.player.play(audio)
    }

    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }
}
