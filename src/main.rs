//! # moodtune - Mood-Driven Music Suggestions
//!
//! Captures your mood from a few detector samples, keeps a history of the
//! results and suggests songs to match.
//!
//! ## Usage
//!
//! ```bash
//! # Capture a mood (mock detector) and get songs
//! moodtune capture
//!
//! # Analyse a still image, five samples
//! moodtune capture --image selfie.jpg --samples 5
//!
//! # Songs for a mood of your choosing
//! moodtune recommend sad
//!
//! # Review or reset the history
//! moodtune history
//! moodtune history --clear
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moodtune::detector::{
    FrameSource, MoodClassifier, RandomClassifier, ScriptedClassifier, StillImageSource,
    SyntheticFrameSource,
};
use moodtune::error::MoodError;
use moodtune::feedback::{Feedback, FeedbackStore};
use moodtune::history::MoodHistory;
use moodtune::mood::Emotion;
use moodtune::recommend::{CatalogRecommender, Song};
use moodtune::sampler::{CancelToken, Sampler};
use moodtune::session::MoodSession;
use moodtune::{aggregator, cli, completion, config};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Main entry point.
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug moodtune capture` - Enable debug logging
/// - `RUST_LOG=moodtune::sampler=trace moodtune capture` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut runtime = config::RuntimeConfig::load()?;
    if let Some(db) = args.db {
        runtime = runtime.with_db_path(db);
    }
    debug!("Runtime configuration: {runtime:?}");

    match args.command {
        cli::Command::Capture {
            image,
            samples,
            interval_ms,
            timeout_ms,
            seed,
            script,
            verbose,
        } => {
            let mut sampling = runtime.sampling;
            if let Some(samples) = samples {
                sampling.samples = samples;
            }
            if let Some(interval_ms) = interval_ms {
                sampling.interval_ms = interval_ms;
            }
            if let Some(timeout_ms) = timeout_ms {
                sampling = sampling.with_timeout_ms(timeout_ms);
            }

            let classifier: Arc<dyn MoodClassifier> = match (script, seed) {
                (Some(script), _) => Arc::new(ScriptedClassifier::parse(&script)?),
                (None, Some(seed)) => Arc::new(RandomClassifier::seeded(seed)),
                (None, None) => Arc::new(
                    RandomClassifier::new()
                        .with_latency(Duration::from_millis(800), Duration::from_secs(1)),
                ),
            };
            let mut frames: Box<dyn FrameSource> = match image {
                Some(path) => Box::new(StillImageSource::open(&path)?),
                None => Box::new(SyntheticFrameSource::new()),
            };
            let recommender = match seed {
                Some(seed) => CatalogRecommender::seeded(seed),
                None => CatalogRecommender::new(),
            }
            .with_limit(runtime.recommendation_limit);

            runtime.prepare_db_dir()?;
            let mut history = open_history(&runtime.db_path)?;
            let mut session = MoodSession::new(&mut history, &recommender, Sampler::new(sampling));

            println!("Analyzing your mood...");
            let outcome = match session.capture(frames.as_mut(), &classifier, &CancelToken::new()) {
                Ok(outcome) => outcome,
                Err(MoodError::DetectorUnavailable(reason)) => {
                    eprintln!("Camera access failed: {reason}");
                    eprintln!("Enable camera permissions or pass --image, then run capture again.");
                    return Err(MoodError::DetectorUnavailable(reason).into());
                }
                Err(MoodError::InsufficientSamples { .. }) => {
                    eprintln!("Could not read your mood from any sample. Try again with better lighting.");
                    return Err(anyhow::anyhow!("no usable mood samples"));
                }
                Err(e) => return Err(e.into()),
            };

            if verbose {
                let batch = &outcome.capture.batch;
                println!(
                    "📊 {} samples attempted, {} dropped",
                    batch.attempted, batch.dropped
                );
                for (i, observation) in batch.observations.iter().enumerate() {
                    println!(
                        "  {}. {} ({:.3})",
                        i + 1,
                        observation.label,
                        observation.confidence
                    );
                }
                for (label, count) in aggregator::tally(&batch.observations) {
                    println!("  {label}: {count}");
                }
            }

            let mood = outcome.capture.mood;
            println!();
            println!("{} Mood detected: {}", mood.label.emoji(), mood.label.as_str().to_uppercase());
            println!("Confidence: {}%", mood.percent());
            println!("{}", mood.label.description());
            println!();
            print_songs(&outcome.songs);
        }
        cli::Command::Recommend {
            mood,
            limit,
            seed,
            json,
        } => {
            let emotion = Emotion::from_label_or_neutral(&mood);
            if emotion.as_str() != mood.trim().to_ascii_lowercase() {
                info!("Unknown mood '{mood}', using {emotion}");
            }
            let recommender = match seed {
                Some(seed) => CatalogRecommender::seeded(seed),
                None => CatalogRecommender::new(),
            }
            .with_limit(limit.or(runtime.recommendation_limit));
            let songs = recommender.recommend_label(&mood)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&songs)?);
            } else {
                println!("{} {}", emotion.emoji(), emotion.description());
                println!();
                print_songs(&songs);
            }
        }
        cli::Command::History { clear, json } => {
            runtime.prepare_db_dir()?;
            let mut history = open_history(&runtime.db_path)?;
            if clear {
                let count = history.len();
                history.clear()?;
                println!("Cleared {count} mood entries");
            } else if json {
                println!("{}", serde_json::to_string_pretty(history.entries())?);
            } else if history.is_empty() {
                println!("No moods captured yet. Run `moodtune capture` to start.");
            } else {
                for entry in history.entries() {
                    println!(
                        "{}  {} {:<9} {:>3}%",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.mood.emoji(),
                        entry.mood.as_str(),
                        (entry.confidence * 100.0).round()
                    );
                }
                println!();
                for (mood, count) in history.mood_counts() {
                    println!("{mood}: {count}");
                }
            }
        }
        cli::Command::Feedback { rating, comment } => {
            runtime.prepare_db_dir()?;
            let latest_mood = open_history(&runtime.db_path)?.latest().map(|e| e.mood);
            let store = FeedbackStore::open(&runtime.db_path)
                .with_context(|| format!("Failed to open feedback store at {}", runtime.db_path.display()))?;
            store.submit(&Feedback::new(rating, comment, latest_mood)?)?;

            println!("Thank you! Your feedback helps us improve our recommendations.");
            if let Some(average) = store.average_rating()? {
                println!("Average rating so far: {average:.1}");
            }
        }
        cli::Command::Moods => {
            for emotion in Emotion::ALL {
                println!("{} {:<9} {}", emotion.emoji(), emotion.as_str(), emotion.description());
            }
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
    }

    Ok(())
}

fn open_history(db_path: &Path) -> Result<MoodHistory> {
    MoodHistory::open(db_path)
        .with_context(|| format!("Failed to open mood history at {}", db_path.display()))
}

fn print_songs(songs: &[Song]) {
    println!("🎵 Your soundtrack:");
    for (i, song) in songs.iter().enumerate() {
        println!(
            "  {}. {} - {} [{}] ({})",
            i + 1,
            song.artist,
            song.title,
            song.genre,
            song.source
        );
        println!("     {}", song.external_url);
    }
}
