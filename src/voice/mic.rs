//! Microphone speech source
//!
//! Drives the capture stream through the endpoint detector to produce one
//! WAV-encoded utterance per listen call. Stale audio is discarded on
//! entry so speech from before the call (including the assistant's own
//! output) is never returned.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::controller::SpeechSource;
use crate::voice::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use crate::voice::endpoint::EndpointDetector;

/// How often buffered samples are pulled from the capture stream
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Microphone-backed speech source
pub struct MicSource {
    capture: AudioCapture,
    detector: EndpointDetector,
    listen_timeout: Duration,
    calibration: Duration,
}

impl MicSource {
    /// Open the default microphone
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new(listen_timeout: Duration, calibration: Duration) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            detector: EndpointDetector::new(),
            listen_timeout,
            calibration,
        })
    }
}

#[async_trait(?Send)]
impl SpeechSource for MicSource {
    async fn listen(&mut self) -> Result<Option<Vec<u8>>> {
        self.capture.start()?;
        self.capture.clear();
        self.detector.reset();

        // Sample the room before listening so the threshold tracks
        // current ambient noise
        tokio::time::sleep(self.calibration).await;
        let ambient = self.capture.drain();
        self.detector.calibrate(&ambient);

        tracing::info!("listening");
        let deadline = tokio::time::Instant::now() + self.listen_timeout;

        loop {
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!("listen window elapsed without speech");
                return Ok(None);
            }

            tokio::time::sleep(POLL_INTERVAL).await;

            let chunk = self.capture.drain();
            if chunk.is_empty() {
                continue;
            }

            if self.detector.push(&chunk) {
                let utterance = self.detector.take_utterance();
                let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;
                return Ok(Some(wav));
            }
        }
    }
}
