//! Utterance endpointing
//!
//! Segments the microphone stream into single utterances using RMS energy:
//! speech starts when energy rises above a threshold calibrated against
//! ambient noise, and ends after a sustained pause.

/// Lowest usable speech threshold regardless of how quiet the room is
const THRESHOLD_FLOOR: f32 = 0.03;

/// Calibrated threshold sits this far above measured ambient energy
const AMBIENT_MULTIPLIER: f32 = 3.0;

/// Shortest segment accepted as speech (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Pause length that ends an utterance (0.5s at 16kHz)
const PAUSE_SAMPLES: usize = 8000;

/// Energy-based utterance detector
pub struct EndpointDetector {
    threshold: f32,
    utterance: Vec<f32>,
    silence_run: usize,
    in_speech: bool,
}

impl EndpointDetector {
    /// Create a detector with the default threshold
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: THRESHOLD_FLOOR,
            utterance: Vec::new(),
            silence_run: 0,
            in_speech: false,
        }
    }

    /// Set the speech threshold from a sample of ambient room noise
    pub fn calibrate(&mut self, ambient: &[f32]) {
        let ambient_energy = rms_energy(ambient);
        self.threshold = (ambient_energy * AMBIENT_MULTIPLIER).max(THRESHOLD_FLOOR);
        tracing::debug!(
            ambient_energy,
            threshold = self.threshold,
            "endpoint detector calibrated"
        );
    }

    /// Feed captured samples; returns true once a complete utterance is held
    pub fn push(&mut self, samples: &[f32]) -> bool {
        let is_speech = rms_energy(samples) > self.threshold;

        if !self.in_speech {
            if is_speech {
                self.in_speech = true;
                self.utterance.clear();
                self.utterance.extend_from_slice(samples);
                self.silence_run = 0;
                tracing::trace!("speech onset");
            }
            return false;
        }

        self.utterance.extend_from_slice(samples);
        if is_speech {
            self.silence_run = 0;
        } else {
            self.silence_run += samples.len();
        }

        if self.silence_run > PAUSE_SAMPLES {
            if self.utterance.len() - self.silence_run > MIN_SPEECH_SAMPLES {
                tracing::debug!(samples = self.utterance.len(), "utterance complete");
                return true;
            }
            // Too short to be speech; back to waiting
            tracing::trace!("segment too short, discarded");
            self.reset();
        }

        false
    }

    /// Take the buffered utterance, resetting the detector
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.utterance);
        self.reset();
        utterance
    }

    /// Discard state and wait for the next speech onset
    pub fn reset(&mut self) {
        self.utterance.clear();
        self.silence_run = 0;
        self.in_speech = false;
    }
}

impl Default for EndpointDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS energy of a sample window
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud(n: usize) -> Vec<f32> {
        vec![0.5f32; n]
    }

    fn quiet(n: usize) -> Vec<f32> {
        vec![0.0f32; n]
    }

    #[test]
    fn test_energy() {
        assert!(rms_energy(&quiet(100)) < 0.001);
        assert!(rms_energy(&loud(100)) > 0.4);
        assert!((rms_energy(&[]) - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_calibration_raises_threshold() {
        let mut detector = EndpointDetector::new();
        detector.calibrate(&vec![0.1f32; 1000]);
        assert!(detector.threshold > THRESHOLD_FLOOR);

        // A silent room still leaves the floor in place
        let mut detector = EndpointDetector::new();
        detector.calibrate(&quiet(1000));
        assert!((detector.threshold - THRESHOLD_FLOOR).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speech_then_pause_completes() {
        let mut detector = EndpointDetector::new();

        assert!(!detector.push(&loud(6000)));
        let done = detector.push(&quiet(PAUSE_SAMPLES + 1));
        assert!(done);

        let utterance = detector.take_utterance();
        assert!(utterance.len() > MIN_SPEECH_SAMPLES);
    }

    #[test]
    fn test_short_blip_discarded() {
        let mut detector = EndpointDetector::new();

        // Below the minimum speech length
        assert!(!detector.push(&loud(1000)));
        assert!(!detector.push(&quiet(PAUSE_SAMPLES + 1)));
        assert!(!detector.in_speech);
    }

    #[test]
    fn test_silence_alone_never_triggers() {
        let mut detector = EndpointDetector::new();
        for _ in 0..20 {
            assert!(!detector.push(&quiet(1600)));
        }
    }
}
