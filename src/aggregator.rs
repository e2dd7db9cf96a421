//! Mood aggregation over a batch of observations.
//!
//! Picks the modal emotion of a batch and averages the confidence of the
//! observations that voted for it.

use crate::error::{MoodError, Result};
use crate::mood::{AggregatedMood, Emotion, Observation};
use log::{debug, trace};
use std::collections::HashMap;

/// Consolidate a batch of observations into one mood decision.
///
/// # Algorithm
///
/// 1. Count how often each label occurs.
/// 2. The modal label is the one with the highest count. Ties go to the
///    label that *reached* the winning count first while scanning in order,
///    so `[A, B]` yields `A` while `[A, B, B, A]` yields `B`.
/// 3. Confidence is the mean over the observations carrying the modal label.
///
/// The function is pure: the same batch always yields the same decision.
///
/// # Errors
///
/// Returns [`MoodError::InsufficientSamples`] for an empty batch.
///
/// # Examples
///
/// ```
/// use moodtune::aggregator::aggregate;
/// use moodtune::mood::{Emotion, Observation};
///
/// let batch = [
///     Observation::new(Emotion::Happy, 0.6),
///     Observation::new(Emotion::Happy, 0.8),
///     Observation::new(Emotion::Sad, 0.3),
/// ];
/// let mood = aggregate(&batch)?;
/// assert_eq!(mood.label, Emotion::Happy);
/// assert!((mood.confidence - 0.7).abs() < 1e-9);
/// # Ok::<(), moodtune::error::MoodError>(())
/// ```
pub fn aggregate(observations: &[Observation]) -> Result<AggregatedMood> {
    let first = observations.first().ok_or(MoodError::InsufficientSamples {
        required: 1,
        available: 0,
    })?;

    let mut counts: HashMap<Emotion, usize> = HashMap::new();
    let mut highest_count = 0;
    let mut modal = first.label;

    for observation in observations {
        let count = counts.entry(observation.label).or_insert(0);
        *count += 1;

        // Strictly greater: an equal count arriving later never steals the lead.
        if *count > highest_count {
            highest_count = *count;
            modal = observation.label;
        }
    }

    let total: f64 = observations
        .iter()
        .filter(|o| o.label == modal)
        .map(|o| o.confidence)
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let mean = total / highest_count as f64;

    trace!("Mood counts: {counts:?}");
    debug!("Aggregated {} observations into {modal} ({mean:.3})", observations.len());

    Ok(AggregatedMood::new(modal, mean))
}

/// Per-label counts in order of first appearance.
#[must_use]
pub fn tally(observations: &[Observation]) -> Vec<(Emotion, usize)> {
    let mut tally: Vec<(Emotion, usize)> = Vec::new();
    for observation in observations {
        match tally.iter_mut().find(|(label, _)| *label == observation.label) {
            Some((_, count)) => *count += 1,
            None => tally.push((observation.label, 1)),
        }
    }
    tally
}

/// Aggregate, substituting the neutral reading when nothing usable arrived.
///
/// Only [`MoodError::InsufficientSamples`] is absorbed.
pub fn aggregate_or_neutral(observations: &[Observation]) -> AggregatedMood {
    aggregate(observations).unwrap_or_else(|_| AggregatedMood::neutral_default())
}
