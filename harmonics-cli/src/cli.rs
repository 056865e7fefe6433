use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use harmonics_core::{NoteModel, TunerConfig, WindowFunction};

#[derive(Parser, Debug)]
#[command(
    name = "harmonics",
    about = "Harmonic spectrum tuner: shows each harmonic's deviation in cents"
)]
pub struct Cli {
    /// JSON configuration file; missing fields use defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Starting note, by name (A4, C#3) or index from the lowest note
    #[arg(short, long)]
    pub note: Option<String>,

    /// Number of harmonic bands
    #[arg(long)]
    pub harmonics: Option<usize>,

    /// Analysis frames per second
    #[arg(long)]
    pub framerate: Option<u32>,

    /// Capture sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Minimum analysis window in seconds
    #[arg(long)]
    pub min_window: Option<f64>,

    /// Apply a Hann window before the transform
    #[arg(long)]
    pub hann: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Write the resolved configuration to this file and exit
    #[arg(long)]
    pub write_config: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (if any) and applies command-line overrides.
    pub fn resolve_config(&self) -> Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let config = TunerConfig::load(path)
                    .with_context(|| format!("loading config from {}", path.display()))?;
                log::info!("[MAIN] Loaded config from {}", path.display());
                config
            }
            None => TunerConfig::default(),
        };

        if let Some(harmonics) = self.harmonics {
            config.harmonics = harmonics;
        }
        if let Some(framerate) = self.framerate {
            config.framerate = framerate;
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(secs) = self.min_window {
            config.min_window_secs = secs;
        }
        if self.hann {
            config.window_function = WindowFunction::Hann;
        }
        if let Some(note) = &self.note {
            config.start_note = parse_note(note, &NoteModel::from_config(&config))?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Accepts a note index or a note name.
pub fn parse_note(text: &str, model: &NoteModel) -> Result<usize> {
    let note = match text.parse::<usize>() {
        Ok(index) => index,
        Err(_) => model
            .note_from_name(text)
            .ok_or_else(|| anyhow!("unknown note name '{}'", text))?,
    };
    if note >= model.n_notes() {
        return Err(anyhow!("note {} is outside 0..{}", note, model.n_notes()));
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> NoteModel {
        NoteModel::from_config(&TunerConfig::default())
    }

    #[test]
    fn parses_names_and_indices() {
        assert_eq!(parse_note("A4", &model()).unwrap(), 48);
        assert_eq!(parse_note("Bb0", &model()).unwrap(), 1);
        assert_eq!(parse_note("12", &model()).unwrap(), 12);
        assert!(parse_note("88", &model()).is_err());
        assert!(parse_note("X9", &model()).is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from(["harmonics", "--note", "C4", "--harmonics", "5", "--hann"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.start_note, 39);
        assert_eq!(config.harmonics, 5);
        assert_eq!(config.window_function, WindowFunction::Hann);
        assert_eq!(config.framerate, 30);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let cli = Cli::parse_from(["harmonics", "--framerate", "0"]);
        assert!(cli.resolve_config().is_err());
    }
}
