//! # Capture Session
//!
//! Ties one capture together: sample, aggregate, record the decision in the
//! history and look up songs for it.
//!
//! The session borrows its collaborators instead of reaching for globals,
//! so callers decide how long the history and recommender live.

use crate::detector::{FrameSource, MoodClassifier};
use crate::error::{MoodError, Result};
use crate::history::{HistoryEntry, MoodHistory};
use crate::recommend::{RecommendationSource, Song};
use crate::sampler::{CancelToken, Capture, Sampler};
use log::info;
use std::sync::Arc;

/// Everything a finished capture produced.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub capture: Capture,
    pub entry: HistoryEntry,
    pub songs: Vec<Song>,
}

pub struct MoodSession<'a> {
    history: &'a mut MoodHistory,
    recommender: &'a dyn RecommendationSource,
    sampler: Sampler,
}

impl<'a> MoodSession<'a> {
    #[must_use]
    pub fn new(
        history: &'a mut MoodHistory,
        recommender: &'a dyn RecommendationSource,
        sampler: Sampler,
    ) -> Self {
        Self {
            history,
            recommender,
            sampler,
        }
    }

    /// Run one full capture.
    ///
    /// A history entry is written only once a mood has been aggregated;
    /// cancelled runs and runs without usable samples leave history as is.
    ///
    /// # Errors
    ///
    /// Sampling errors (`Cancelled`, `DetectorUnavailable`,
    /// `InsufficientSamples`), storage errors and recommendation errors.
    pub fn capture<F>(
        &mut self,
        frames: &mut F,
        classifier: &Arc<dyn MoodClassifier>,
        cancel: &CancelToken,
    ) -> Result<CaptureOutcome>
    where
        F: FrameSource + ?Sized,
    {
        classifier.warm_up()?;
        let capture = self.sampler.capture(frames, classifier, cancel)?;
        if cancel.is_cancelled() {
            info!("Capture cancelled before recording");
            return Err(MoodError::Cancelled);
        }
        let entry = self.history.record(&capture.mood)?;
        info!(
            "Mood detected: {} ({}%)",
            capture.mood.label,
            capture.mood.percent()
        );

        let songs = self.recommender.recommend(capture.mood.label)?;
        Ok(CaptureOutcome {
            capture,
            entry,
            songs,
        })
    }

    /// Fresh recommendations for the latest recorded mood, if any.
    pub fn refresh(&self) -> Result<Option<Vec<Song>>> {
        self.history
            .latest()
            .map(|entry| self.recommender.recommend(entry.mood))
            .transpose()
    }

    #[must_use]
    pub fn history(&self) -> &MoodHistory {
        &*self.history
    }
}
