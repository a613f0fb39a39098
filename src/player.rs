//! Audio playback through rodio.
//!
//! Playback is fire-and-forget: `play` returns once the clip is queued.
//! Starting a new clip stops the previous one.

use std::io::Cursor;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open audio output: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

pub trait AudioPlayer {
    /// Start playing an encoded clip (WAV, MP3, ...).
    fn play(&mut self, audio: &[u8]) -> Result<(), PlaybackError>;
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

#[derive(Default)]
pub struct RodioPlayer {
    // Opened on first use and kept for the process lifetime.
    output_stream: Option<OutputStream>,
    active_sink: Option<Sink>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioPlayer for RodioPlayer {
    fn play(&mut self, audio: &[u8]) -> Result<(), PlaybackError> {
        self.stop();

        if self.output_stream.is_none() {
            let stream = OutputStreamBuilder::open_default_stream()?;
            info!("Audio output opened");
            self.output_stream = Some(stream);
        }
        let Some(stream) = self.output_stream.as_ref() else {
            return Ok(());
        };

        let source = Decoder::new(Cursor::new(audio.to_vec()))?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(source);
        debug!("Playing {} bytes of audio", audio.len());

        self.active_sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.active_sink.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.active_sink.as_ref().is_some_and(|s| !s.empty())
    }
}
