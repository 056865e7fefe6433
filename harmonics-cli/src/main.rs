//! # Harmonics - Terminal Harmonic Spectrum Tuner
//!
//! Captures audio from the default input device, runs the spectrum engine at
//! a fixed frame rate and prints, for every harmonic of the selected note,
//! where the spectral power sits in cents.
//!
//! ## Architecture
//! - **Audio callback**: CPAL pushes sample blocks into a channel
//! - **Input thread**: reads note-change commands from stdin
//! - **Main thread**: tick loop; applies queued commands between frames

mod cli;
mod display;
mod input;

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, select};
use harmonics_core::{ChannelSource, SpectrumEngine, TunerError, audio};

use cli::Cli;
use display::TextDisplay;
use input::NoteCommand;

const GAUGE_WIDTH: usize = 41;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let mut config = cli.resolve_config()?;

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("writing config to {}", path.display()))?;
        log::info!("[MAIN] Wrote configuration to {}", path.display());
        return Ok(());
    }

    log::info!("[MAIN] Starting audio capture...");
    let (audio_tx, audio_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
    let (stream, sample_rate) = audio::start_audio_capture(audio_tx, config.sample_rate)?;
    if sample_rate != config.sample_rate {
        log::warn!(
            "[MAIN] Device runs at {} Hz instead of {} Hz; sizing the window for it",
            sample_rate,
            config.sample_rate
        );
        config.sample_rate = sample_rate;
    }

    let mut engine = SpectrumEngine::new(config.clone())?;
    engine.set_note(config.start_note)?;

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    input::spawn_stdin_reader(command_tx);
    println!(
        "Commands: left/right = semitone, down/up = octave, +N/-N, q = quit"
    );

    let mut source = ChannelSource::new(audio_rx);
    let result = run_tick_loop(&mut engine, &mut source, command_rx, cli.frames);

    log::info!("[MAIN] Stopping stream...");
    if let Err(e) = stream.pause() {
        log::warn!("[MAIN] Error pausing stream: {}", e);
    }
    drop(stream);
    result
}

/// Runs one analysis frame per tick until told to stop.
///
/// Note commands are queued on the engine as they arrive and only take
/// effect when the next frame starts.
fn run_tick_loop(
    engine: &mut SpectrumEngine,
    source: &mut ChannelSource,
    commands: Receiver<NoteCommand>,
    max_frames: Option<u64>,
) -> Result<()> {
    let model = *engine.model();
    let display = TextDisplay::new(GAUGE_WIDTH, engine.config().y_max);
    let ticker = crossbeam_channel::tick(engine.config().frame_interval());
    let no_input = crossbeam_channel::never();
    let mut input_open = true;
    let mut frames = 0u64;

    loop {
        select! {
            recv(if input_open { &commands } else { &no_input }) -> msg => match msg {
                Ok(NoteCommand::Shift(delta)) => match engine.change_note(delta) {
                    Some(note) => log::info!(
                        "[INPUT] Switching to {} at the next frame",
                        model.note_to_name(note as f64)
                    ),
                    None => log::debug!("[INPUT] Already at the edge of the note range"),
                },
                Ok(NoteCommand::Quit) => {
                    log::info!("[MAIN] Quit requested");
                    return Ok(());
                }
                Err(_) => {
                    // stdin closed; keep analysing without input.
                    input_open = false;
                }
            },
            recv(ticker) -> _ => {
                match engine.get_spectrum(source) {
                    Ok(frame) => println!("{}\n", display.render(frame, &model)),
                    Err(e @ TunerError::TransformFailure(_)) => {
                        return Err(e).context("analysis stopped");
                    }
                    Err(e) => return Err(e.into()),
                }

                frames += 1;
                if max_frames.is_some_and(|max| frames >= max) {
                    log::info!("[MAIN] Rendered {} frames", frames);
                    return Ok(());
                }
                if !source.is_connected() {
                    log::warn!("[MAIN] Audio stream ended");
                    return Ok(());
                }
            },
        }
    }
}
