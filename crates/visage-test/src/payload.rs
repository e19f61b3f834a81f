//! Backend message builders

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

/// Bytes per second of the fake audio produced by `TtsBuilder::with_audio`
///
/// `ScriptedAudio` reverses this to recover the playback length.
pub const FAKE_AUDIO_RATE: usize = 8000;

/// Builder for `tts` frames
#[derive(Debug, Clone, Default)]
pub struct TtsBuilder {
    reply: String,
    emotion: Option<String>,
    cues: Vec<(f64, f64, String)>,
    duration: Option<f64>,
    audio_secs: Option<f64>,
    raw_audio: Option<String>,
}

impl TtsBuilder {
    pub fn new(reply: &str) -> Self {
        TtsBuilder {
            reply: reply.to_string(),
            ..Default::default()
        }
    }

    pub fn emotion(mut self, emotion: &str) -> Self {
        self.emotion = Some(emotion.to_string());
        self
    }

    pub fn cue(mut self, start: f64, end: f64, viseme: &str) -> Self {
        self.cues.push((start, end, viseme.to_string()));
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Attach silent audio lasting `secs`
    pub fn with_audio(mut self, secs: f64) -> Self {
        self.audio_secs = Some(secs);
        self
    }

    /// Attach an arbitrary (possibly invalid) audio field
    pub fn raw_audio(mut self, encoded: &str) -> Self {
        self.raw_audio = Some(encoded.to_string());
        self
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "type": "tts",
            "reply": self.reply,
        });
        if let Some(emotion) = &self.emotion {
            value["emotion"] = json!(emotion);
        }
        if !self.cues.is_empty() {
            value["visemes"] = self
                .cues
                .iter()
                .map(|(start, end, viseme)| json!({ "start": start, "end": end, "viseme": viseme }))
                .collect();
        }
        if let Some(duration) = self.duration {
            value["duration"] = json!(duration);
        }
        if let Some(secs) = self.audio_secs {
            let bytes = vec![0u8; (secs * FAKE_AUDIO_RATE as f64).round() as usize];
            value["audio"] = json!(BASE64.encode(bytes));
        }
        if let Some(raw) = &self.raw_audio {
            value["audio"] = json!(raw);
        }
        value
    }

    pub fn build(&self) -> String {
        self.to_value().to_string()
    }
}

pub fn info_message(msg: &str) -> String {
    json!({ "type": "info", "msg": msg }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::InboundMessage;

    #[test]
    fn test_builds_parseable_tts() {
        let text = TtsBuilder::new("hi")
            .emotion("happy")
            .cue(0.0, 0.2, "A")
            .duration(0.5)
            .with_audio(0.5)
            .build();

        let InboundMessage::Tts(response) = InboundMessage::from_json(&text).unwrap() else {
            panic!("not a tts frame");
        };
        assert_eq!(response.emotion.as_deref(), Some("happy"));
        assert_eq!(response.cues().len(), 1);
        assert_eq!(response.decode_audio().unwrap().map(|b| b.len()), Some(4000));
    }

    #[test]
    fn test_builds_info() {
        let parsed = InboundMessage::from_json(&info_message("hello")).unwrap();
        assert_eq!(parsed, InboundMessage::Info { msg: "hello".to_string() });
    }
}
