//! Mood-driven music suggestions.
//!
//! Core modules:
//! - [`detector`] - Frame sources and mood classifiers
//! - [`sampler`] - Timed, cancellable multi-sample collection
//! - [`aggregator`] - Majority vote over observations
//! - [`history`] - Persistent, append-only mood history
//! - [`recommend`] - Mood-indexed song catalog
//! - [`session`] - One capture from sampling to songs
//!
//! ### Supporting Modules
//!
//! - [`mood`] - Emotion labels and confidence values
//! - [`feedback`] - Ratings for the recommendations
//! - [`error`] - Library error type
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodtune::detector::{MoodClassifier, RandomClassifier, SyntheticFrameSource};
//! use moodtune::history::MoodHistory;
//! use moodtune::recommend::CatalogRecommender;
//! use moodtune::sampler::{CancelToken, Sampler, SamplingConfig};
//! use moodtune::session::MoodSession;
//! use std::sync::Arc;
//!
//! let db_path = moodtune::config::get_db_path()?;
//! let mut history = MoodHistory::open(&db_path)?;
//! let recommender = CatalogRecommender::new();
//! let mut session = MoodSession::new(
//!     &mut history,
//!     &recommender,
//!     Sampler::new(SamplingConfig::default()),
//! );
//!
//! let classifier: Arc<dyn MoodClassifier> = Arc::new(RandomClassifier::new());
//! let outcome = session.capture(
//!     &mut SyntheticFrameSource::new(),
//!     &classifier,
//!     &CancelToken::new(),
//! )?;
//!
//! println!("{} at {}%", outcome.capture.mood.label, outcome.capture.mood.percent());
//! for song in &outcome.songs {
//!     println!("{} - {}", song.artist, song.title);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Aggregation
//!
//! A capture takes N samples (3 by default, 300 ms apart). The label seen
//! most often wins; on a tie the label that reached the winning count first
//! wins. The reported confidence is the mean confidence of the winning
//! label's samples only. Samples that fail or time out are dropped and the
//! vote runs over the rest.

pub mod aggregator;
pub mod cli;
pub mod completion;
pub mod config;
pub mod detector;
pub mod error;
pub mod feedback;
pub mod history;
pub mod mood;
pub mod recommend;
pub mod sampler;
pub mod session;
