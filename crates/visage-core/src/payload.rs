//! Wire payloads exchanged with the chat backend
//!
//! The transport itself lives outside the engine; these are the logical
//! shapes only.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::{EmotionId, VisageError, VisageResult};

/// One timed viseme cue as sent by the backend (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisemeCue {
    pub start: f64,
    pub end: f64,
    pub viseme: String,
}

impl VisemeCue {
    pub fn new(start: f64, end: f64, viseme: &str) -> Self {
        Self {
            start,
            end,
            viseme: viseme.to_string(),
        }
    }
}

/// Spoken bot response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub emotion: Option<String>,
    /// Base64-encoded wave bytes
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub visemes: Option<Vec<VisemeCue>>,
    /// Total audio duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TtsResponse {
    pub fn emotion_id(&self) -> EmotionId {
        EmotionId::from_wire(self.emotion.as_deref())
    }

    pub fn cues(&self) -> &[VisemeCue] {
        self.visemes.as_deref().unwrap_or(&[])
    }

    pub fn has_audio(&self) -> bool {
        self.audio.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Decode the audio payload. `Ok(None)` when no audio was sent.
    pub fn decode_audio(&self) -> VisageResult<Option<Vec<u8>>> {
        match self.audio.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(encoded) => BASE64
                .decode(encoded)
                .map(Some)
                .map_err(|e| VisageError::InvalidAudio(e.to_string())),
        }
    }

    /// Positive, finite duration if one was reported
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Inbound message from the chat backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Tts(TtsResponse),
    Info {
        #[serde(default)]
        msg: String,
    },
}

impl InboundMessage {
    /// Parse a JSON text frame
    pub fn from_json(text: &str) -> VisageResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outbound user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    UserMessage { text: String },
}

impl OutboundMessage {
    /// Build a user message, trimming input. Blank input yields `None`.
    pub fn user_message(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(OutboundMessage::UserMessage {
                text: text.to_string(),
            })
        }
    }

    pub fn to_json(&self) -> VisageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Body for the HTTP chat endpoint variant
    pub fn chat_request(&self) -> ChatRequest {
        match self {
            OutboundMessage::UserMessage { text } => ChatRequest { text: text.clone() },
        }
    }
}

/// HTTP chat endpoint body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}
