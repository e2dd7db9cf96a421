//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for moodtune using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `capture`: Sample the detector, record the mood, suggest songs
//! - `recommend`: Suggest songs for a mood you name yourself
//! - `history`: Show or clear past mood captures
//! - `feedback`: Rate the latest recommendations
//! - `moods`: List the moods moodtune understands
//!
//! ## Examples
//!
//! ```bash
//! moodtune capture --image selfie.jpg
//! moodtune recommend happy --limit 2
//! moodtune history --json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "Moodtune: capture your mood, get a soundtrack")]
#[command(version)]
pub struct Args {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "MOODTUNE_DB")]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture your mood and get music for it
    ///
    /// Takes several samples from the detector, settles on the most frequent
    /// mood, stores it in your history and prints matching songs.
    Capture {
        /// Still image to analyse instead of the synthetic camera
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        image: Option<PathBuf>,

        /// Number of samples to take
        #[arg(long)]
        samples: Option<usize>,

        /// Pause between samples in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Give up on a single sample after this many milliseconds (0 waits forever)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Seed the mock detector and the shuffle for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Replay detector readings instead of guessing, e.g. "happy:0.6,sad:0.3,fail"
        #[arg(long)]
        script: Option<String>,

        /// Show every sample and the tally
        #[arg(short, long)]
        verbose: bool,
    },

    /// Suggest songs for a mood
    ///
    /// Unknown moods get the balanced (neutral) selection.
    Recommend {
        /// Mood name, e.g. happy, sad, angry, fearful, surprised, neutral
        mood: String,

        /// Maximum number of songs
        #[arg(long)]
        limit: Option<usize>,

        /// Seed the shuffle for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print songs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show past mood captures
    History {
        /// Delete the whole history
        #[arg(long)]
        clear: bool,

        /// Print history as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate the music recommendations
    Feedback {
        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Free-text comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// List the moods moodtune can detect
    Moods,

    /// Generate shell completions
    ///
    /// Usage: moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_capture() {
        let args = Args::parse_from([
            "moodtune", "--db", "/tmp/m.db", "capture", "--samples", "5", "--seed", "3", "-v",
        ]);
        assert_eq!(args.db, Some(PathBuf::from("/tmp/m.db")));
        match args.command {
            Command::Capture { samples, seed, verbose, image, .. } => {
                assert_eq!(samples, Some(5));
                assert_eq!(seed, Some(3));
                assert!(verbose);
                assert!(image.is_none());
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_feedback_rating_range() {
        assert!(Args::try_parse_from(["moodtune", "feedback", "--rating", "4"]).is_ok());
        assert!(Args::try_parse_from(["moodtune", "feedback", "--rating", "9"]).is_err());
    }
}
