//! Audio playback to the speakers

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

struct PlayState {
    samples: Vec<f32>,
    cursor: usize,
    finished: bool,
}

fn output_device() -> Result<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))
}

/// Plays audio to the default output device
pub struct AudioPlayback {
    config: StreamConfig,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new() -> Result<Self> {
        let device = output_device()?;

        let rate_fits = |c: &cpal::SupportedStreamConfigRange| {
            c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
        };

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| c.channels() == 1 && rate_fits(c))
            .or_else(|| {
                // Fallback: stereo
                device
                    .supported_output_configs()
                    .ok()?
                    .find(|c| c.channels() == 2 && rate_fits(c))
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Play raw f32 samples to completion
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::unused_async)]
    pub async fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        self.play_blocking(samples)
    }

    /// Play MP3 audio to completion
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play_blocking(samples)
    }

    fn play_blocking(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = output_device()?;
        let channels = self.config.channels as usize;
        let sample_count = samples.len();

        let state = Arc::new(Mutex::new(PlayState {
            samples,
            cursor: 0,
            finished: false,
        }));
        let callback_state = Arc::clone(&state);

        let stream = device
            .build_output_stream(
                &self.config.clone(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut state) = callback_state.lock() else {
                        return;
                    };

                    for frame in data.chunks_mut(channels) {
                        let sample = if state.cursor < state.samples.len() {
                            let s = state.samples[state.cursor];
                            state.cursor += 1;
                            s
                        } else {
                            state.finished = true;
                            0.0
                        };
                        frame.fill(sample);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion, bounded by the clip duration plus slack
        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        loop {
            let finished = state.lock().map(|s| s.finished).unwrap_or(true);
            if finished || std::time::Instant::now() > deadline {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    // Downmix stereo
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}
