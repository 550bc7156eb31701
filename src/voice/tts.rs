//! Text-to-speech synthesis

use crate::controller::VoiceIdentity;
use crate::{Error, Result};

/// Synthesizes speech from text via the `OpenAI` TTS API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a TTS instance with the default model
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, speed: f32) -> Result<Self> {
        Self::with_model(api_key, speed, "tts-1".to_string())
    }

    /// Create a TTS instance with a custom model
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn with_model(api_key: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            speed,
            model,
        })
    }

    /// Synthesize text with the requested voice identity
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, voice: VoiceIdentity) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: voice_name(voice),
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Best-effort mapping from a requested identity to an available voice
const fn voice_name(voice: VoiceIdentity) -> &'static str {
    match voice {
        VoiceIdentity::Female => "nova",
        VoiceIdentity::Male => "onyx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_mapping() {
        assert_eq!(voice_name(VoiceIdentity::Female), "nova");
        assert_eq!(voice_name(VoiceIdentity::Male), "onyx");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(TextToSpeech::new(String::new(), 1.0).is_err());
    }
}
