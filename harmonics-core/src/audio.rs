//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library)
//! and hands the captured samples to the spectrum engine.
//!
//! ## Features
//! - [`SampleSource`]: the non-blocking read contract the engine pulls from
//! - [`ChannelSource`]: a source fed by the capture callback over a channel
//! - Default input device selection with mono down-mixing

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Anything the engine can pull audio from.
///
/// `read` must not block: it returns whatever is available right now, at
/// most `max_samples` samples, normalized to `[-1, 1]`.
pub trait SampleSource {
    fn read(&mut self, max_samples: usize) -> Vec<f32>;
}

impl<F> SampleSource for F
where
    F: FnMut(usize) -> Vec<f32>,
{
    fn read(&mut self, max_samples: usize) -> Vec<f32> {
        let mut block = self(max_samples);
        block.truncate(max_samples);
        block
    }
}

/// Sample source draining blocks sent by a capture callback.
///
/// Every read empties the channel. When more than `max_samples` arrived
/// since the last read, only the newest are returned and the rest are
/// dropped, so the window never lags behind live audio.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<Vec<f32>>,
    connected: bool,
    dropped: u64,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Vec<f32>>) -> Self {
        Self {
            receiver,
            connected: true,
            dropped: 0,
        }
    }

    /// False once the sending side has gone away.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Total samples discarded because newer ones filled the read.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl SampleSource for ChannelSource {
    fn read(&mut self, max_samples: usize) -> Vec<f32> {
        let mut samples = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(block) => {
                    samples.extend(block);
                    // Older samples can never reach the caller.
                    let surplus = samples.len().saturating_sub(max_samples);
                    if surplus > 0 {
                        samples.drain(..surplus);
                        self.dropped += surplus as u64;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::warn!("[AUDIO] Capture channel closed");
                    }
                    self.connected = false;
                    break;
                }
            }
        }
        samples
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 configuration as close as possible to `target_rate`
/// 3. Sends every captured block, down-mixed to mono, over `sender`
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the rate in use
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("[AUDIO] Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    log::info!(
        "[AUDIO] Selected sample rate: {} Hz, {} channel(s)",
        rate,
        channels
    );

    let err_fn = |err| log::error!("[AUDIO] An error occurred on the audio stream: {}", err);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let block = downmix(data, channels);
            // An unbounded channel only fails once the reader is gone.
            let _ = sender.try_send(block);
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, rate))
}

/// Averages interleaved frames down to one channel.
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Finds the best supported f32 configuration for the target sample rate.
///
/// Mono configurations win over multi-channel ones; within each group the
/// one whose rate range lies closest to `target_rate` is chosen.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if target_rate < min {
                min - target_rate
            } else {
                target_rate.saturating_sub(max)
            };
            (c.channels() != 1, distance)
        })
}
