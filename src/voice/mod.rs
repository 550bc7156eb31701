//! Voice pipeline: capture, utterance endpointing, transcription,
//! synthesis, and playback

pub mod capture;
pub mod endpoint;
pub mod mic;
pub mod playback;
pub mod speaker;
pub mod stt;
pub mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use endpoint::EndpointDetector;
pub use mic::MicSource;
pub use playback::AudioPlayback;
pub use speaker::SpeakerSink;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
