//! Sound card as the X/Y DAC
//!
//! The renderer pushes packed samples into a ring; the cpal callback drains
//! it, putting x on the left channel and y on the right. A scope in X/Y mode
//! wired to the line output then traces the beam.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use nether_vector::{RingSource, pack_sample};
use tracing::{debug, error};

use crate::config::{OutputConfig, UnderrunMode};

/// Center of a 16-bit channel, 0.0 after conversion
const CENTER: u16 = 0x8000;

/// Convert one 16-bit DAC channel to a float sample in [-1.0, 1.0)
pub fn channel_to_f32(value: u16) -> f32 {
    value as f32 / 32768.0 - 1.0
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

fn f32_to_u16(sample: f32) -> u16 {
    (sample * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16
}

/// Fills interleaved device frames from the sample ring
///
/// Lives inside the output callback.
pub struct FrameFiller {
    source: RingSource,
    scratch: Vec<u32>,
    underrun: UnderrunMode,
    last: u32,
    underruns: Arc<AtomicU64>,
}

impl FrameFiller {
    pub fn new(source: RingSource, underrun: UnderrunMode) -> Self {
        Self {
            source,
            // Pre-allocate for typical callback sizes
            scratch: vec![0; 4096],
            underrun,
            last: pack_sample(CENTER, CENTER),
            underruns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared count of frames played without a sample
    pub fn underruns(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.underruns)
    }

    /// Fill `data` (interleaved, `channels` per frame)
    ///
    /// Channels beyond the first two are silent.
    pub fn fill<T: Copy>(&mut self, data: &mut [T], channels: usize, convert: impl Fn(f32) -> T) {
        let channels = channels.max(1);
        let frames = data.len() / channels;
        // Resize scratch if needed (rare, only on first use or a larger callback)
        if self.scratch.len() < frames {
            self.scratch.resize(frames, 0);
        }

        let popped = self.source.pop_into(&mut self.scratch[..frames]);
        if let Some(&sample) = self.scratch[..popped].last() {
            self.last = sample;
        }

        let idle = match self.underrun {
            UnderrunMode::Zero => pack_sample(CENTER, CENTER),
            UnderrunMode::Hold => self.last,
        };
        let silence = convert(0.0);

        for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
            let sample = if i < popped { self.scratch[i] } else { idle };
            let x = channel_to_f32((sample & 0xFFFF) as u16);
            let y = channel_to_f32((sample >> 16) as u16);

            frame[0] = convert(x);
            if channels > 1 {
                frame[1] = convert(y);
            }
            for extra in frame.iter_mut().skip(2) {
                *extra = silence;
            }
        }

        if popped < frames {
            self.underruns
                .fetch_add((frames - popped) as u64, Ordering::Relaxed);
        }
    }
}

/// Open audio output stream
pub struct AudioOutput {
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
    underruns: Arc<AtomicU64>,
}

impl AudioOutput {
    /// Open the default output device and start draining `source`
    pub fn new(source: RingSource, output: &OutputConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"))?;

        let supported = match output.sample_rate {
            Some(rate) => device
                .supported_output_configs()
                .context("Failed to query output configs")?
                .filter(|range| range.channels() >= 2)
                .find_map(|range| range.try_with_sample_rate(cpal::SampleRate(rate)))
                .ok_or_else(|| anyhow!("Device cannot play stereo at {}Hz", rate))?,
            None => device
                .default_output_config()
                .context("Failed to get default output config")?,
        };

        let channels = supported.channels();
        if channels < 2 {
            bail!("Output device has {} channel(s), X/Y needs two", channels);
        }
        let sample_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let mut filler = FrameFiller::new(source, output.underrun);
        let underruns = filler.underruns();
        let frame_width = channels as usize;

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    filler.fill(data, frame_width, |s| s);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    filler.fill(data, frame_width, f32_to_i16);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::U16 => device.build_output_stream(
                &config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    filler.fill(data, frame_width, f32_to_u16);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            other => bail!("Unsupported sample format: {:?}", other),
        }
        .context("Failed to build audio stream")?;

        stream.play().context("Failed to play audio stream")?;
        debug!("Audio stream format: {:?}", sample_format);

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
            underruns,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames played without a sample from the renderer
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        debug!("Audio output closed, {} underrun frames", self.underruns());
    }
}
