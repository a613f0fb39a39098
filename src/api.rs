//! Client for the remote voice cloning and text-to-speech endpoints.
//!
//! Both endpoints take and return JSON. Audio travels as standard base64 in
//! both directions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;

pub const CLONE_VOICE_PATH: &str = "clone_voice";
pub const TEXT_TO_SPEECH_PATH: &str = "text_to_speech";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}

/// Where the service splices its motivational quote into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotePosition {
    #[default]
    Start,
    End,
}

impl fmt::Display for QuotePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

impl FromStr for QuotePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            other => Err(format!("unknown quote position '{other}' (expected start or end)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloneRequest {
    pub voice_name: String,
    pub voice_samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub include_quote: bool,
    pub quote_position: QuotePosition,
}

/// Synthesis result as it comes off the wire. `audio` is still base64.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechPayload {
    pub audio: String,
    /// Text the service actually spoke, quote included.
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct CloneResponse {
    voice_id: Option<String>,
}

#[derive(Deserialize)]
struct SpeechResponse {
    audio: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
}

/// The remote collaborator behind voice creation and synthesis.
#[async_trait]
pub trait VoiceService: Send + Sync {
    /// Create a voice from base64 samples and return its identifier.
    async fn clone_voice(&self, request: &CloneRequest) -> Result<String, ServiceError>;

    async fn text_to_speech(&self, request: &SpeechRequest) -> Result<SpeechPayload, ServiceError>;
}

pub fn encode_sample(audio: &[u8]) -> String {
    STANDARD.encode(audio)
}

pub fn decode_audio(payload: &str) -> Result<Vec<u8>, ServiceError> {
    Ok(STANDARD.decode(payload.trim())?)
}

pub struct HttpVoiceService {
    base_url: String,
    client: Client,
}

impl HttpVoiceService {
    pub fn new(config: &ApiConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("POST {url}");

        let resp = match self.client.post(&url).json(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_connect() {
                    warn!("Cannot connect to voice service at {}", self.base_url);
                } else if e.is_timeout() {
                    warn!("Voice service request to {endpoint} timed out");
                }
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = error_message(&text);
            warn!("{endpoint} returned status {status}: {message}");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<R>().await?)
    }
}

/// Pull the `error` field out of a failure body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    match parsed {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl VoiceService for HttpVoiceService {
    async fn clone_voice(&self, request: &CloneRequest) -> Result<String, ServiceError> {
        info!(
            "Cloning voice '{}' from {} sample(s)",
            request.voice_name,
            request.voice_samples.len()
        );
        let resp: CloneResponse = self.post(CLONE_VOICE_PATH, request).await?;
        match resp.voice_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ServiceError::MissingField("voice_id")),
        }
    }

    async fn text_to_speech(&self, request: &SpeechRequest) -> Result<SpeechPayload, ServiceError> {
        info!(
            "Requesting speech for {} chars (voice: {}, quote: {})",
            request.text.chars().count(),
            request.voice_id,
            if request.include_quote {
                request.quote_position.to_string()
            } else {
                "none".to_string()
            }
        );
        let resp: SpeechResponse = self.post(TEXT_TO_SPEECH_PATH, request).await?;
        match resp.audio {
            Some(audio) if !audio.is_empty() => Ok(SpeechPayload {
                audio,
                text: resp.text,
            }),
            _ => Err(ServiceError::MissingField("audio")),
        }
    }
}
