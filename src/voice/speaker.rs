//! Speaker speech sink
//!
//! Couples synthesis and playback into a single sink that returns only
//! after the reply has finished playing, so listening never resumes while
//! the assistant is still speaking.

use async_trait::async_trait;

use crate::Result;
use crate::controller::{SpeechSink, VoiceIdentity};
use crate::voice::playback::AudioPlayback;
use crate::voice::tts::TextToSpeech;

/// TTS-backed speech sink playing through the default output device
pub struct SpeakerSink {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl SpeakerSink {
    /// Create a sink from a synthesizer and an opened playback device
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl SpeechSink for SpeakerSink {
    async fn speak(&mut self, text: &str, voice: VoiceIdentity) -> Result<()> {
        tracing::info!(reply = %text, "speaking");
        let audio = self.tts.synthesize(text, voice).await?;
        self.playback.play_mp3(&audio).await
    }
}
