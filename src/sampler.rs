//! # Sampling Loop
//!
//! Collects a fixed number of observations from a [`FrameSource`] and a
//! [`MoodClassifier`], pausing between attempts, then hands the batch to the
//! aggregator.
//!
//! ## Failure policy
//!
//! - No frame, a classifier error or a classifier timeout drops that attempt.
//!   Dropped attempts shrink the batch; they are not retried.
//! - [`MoodError::DetectorUnavailable`] from the frame source aborts the run.
//! - Cancelling the [`CancelToken`] aborts the run with
//!   [`MoodError::Cancelled`], including mid-pause.
//!
//! Each classification runs on a helper thread so a hung classifier can be
//! abandoned after `sample_timeout`. Its late reply is discarded.

use crate::aggregator;
use crate::detector::{Frame, FrameSource, MoodClassifier};
use crate::error::{MoodError, Result};
use crate::mood::{AggregatedMood, Observation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Attempts per capture.
    pub samples: usize,
    /// Pause between attempts.
    pub interval_ms: u64,
    /// Per-attempt classification deadline; `None` waits forever.
    pub sample_timeout_ms: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples: 3,
            interval_ms: 300,
            sample_timeout_ms: Some(2_000),
        }
    }
}

impl SamplingConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn sample_timeout(&self) -> Option<Duration> {
        self.sample_timeout_ms.map(Duration::from_millis)
    }

    /// Set the per-attempt deadline; `0` disables it.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.sample_timeout_ms = if timeout_ms == 0 { None } else { Some(timeout_ms) };
        self
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared flag that stops a capture in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if let Ok(mut cancelled) = self.inner.cancelled.lock() {
            *cancelled = true;
        }
        self.inner.wake.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.lock().map(|c| *c).unwrap_or(true)
    }

    /// Sleep for `timeout` unless cancelled first. Returns whether cancelled.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        let Ok(guard) = self.inner.cancelled.lock() else {
            return true;
        };
        match self.inner.wake.wait_timeout_while(guard, timeout, |c| !*c) {
            Ok((cancelled, _)) => *cancelled,
            Err(_) => true,
        }
    }
}

/// Observations gathered by one sampling run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleBatch {
    pub observations: Vec<Observation>,
    pub attempted: usize,
    pub dropped: usize,
}

/// Result of a full capture: the batch and its aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub batch: SampleBatch,
    pub mood: AggregatedMood,
}

/// Count-bounded sampling loop.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    config: SamplingConfig,
}

impl Sampler {
    #[must_use]
    pub const fn new(config: SamplingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Run `samples` attempts and return what survived.
    ///
    /// # Errors
    ///
    /// - [`MoodError::Cancelled`] if `cancel` fires before the run ends
    /// - [`MoodError::DetectorUnavailable`] if the frame source is gone
    pub fn collect<F>(
        &self,
        frames: &mut F,
        classifier: &Arc<dyn MoodClassifier>,
        cancel: &CancelToken,
    ) -> Result<SampleBatch>
    where
        F: FrameSource + ?Sized,
    {
        let mut batch = SampleBatch::default();

        for attempt in 0..self.config.samples {
            if cancel.is_cancelled() {
                info!("Capture cancelled before attempt {}", attempt + 1);
                return Err(MoodError::Cancelled);
            }
            batch.attempted += 1;

            match self.attempt(frames, classifier) {
                Ok(Some(observation)) => {
                    debug!(
                        "Sample {}: {} ({:.3})",
                        attempt + 1,
                        observation.label,
                        observation.confidence
                    );
                    batch.observations.push(observation);
                }
                Ok(None) => {
                    debug!("Sample {}: no frame, dropped", attempt + 1);
                    batch.dropped += 1;
                }
                Err(e) if e.is_sample_local() => {
                    warn!("Sample {} dropped: {e}", attempt + 1);
                    batch.dropped += 1;
                }
                Err(e) => return Err(e),
            }

            let last = attempt + 1 == self.config.samples;
            if !last && cancel.wait(self.config.interval()) {
                info!("Capture cancelled after attempt {}", attempt + 1);
                return Err(MoodError::Cancelled);
            }
        }

        // A cancel may land while the final sample is being classified.
        if cancel.is_cancelled() {
            info!("Capture cancelled during the final attempt");
            return Err(MoodError::Cancelled);
        }

        info!(
            "Collected {} of {} samples ({} dropped)",
            batch.observations.len(),
            batch.attempted,
            batch.dropped
        );
        Ok(batch)
    }

    /// Collect a batch and aggregate it.
    ///
    /// # Errors
    ///
    /// Everything [`Sampler::collect`] returns, plus
    /// [`MoodError::InsufficientSamples`] when every attempt was dropped.
    pub fn capture<F>(
        &self,
        frames: &mut F,
        classifier: &Arc<dyn MoodClassifier>,
        cancel: &CancelToken,
    ) -> Result<Capture>
    where
        F: FrameSource + ?Sized,
    {
        let batch = self.collect(frames, classifier, cancel)?;
        let mood = aggregator::aggregate(&batch.observations)?;
        Ok(Capture { batch, mood })
    }

    fn attempt<F>(&self, frames: &mut F, classifier: &Arc<dyn MoodClassifier>) -> Result<Option<Observation>>
    where
        F: FrameSource + ?Sized,
    {
        let Some(frame) = frames.capture()? else {
            return Ok(None);
        };
        classify_with_timeout(classifier, frame, self.config.sample_timeout()).map(Some)
    }
}

fn classify_with_timeout(
    classifier: &Arc<dyn MoodClassifier>,
    frame: Frame,
    timeout: Option<Duration>,
) -> Result<Observation> {
    let Some(timeout) = timeout else {
        return classifier.classify(&frame);
    };

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(classifier);
    thread::Builder::new()
        .name("mood-classify".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = tx.send(worker.classify(&frame));
        })
        .map_err(|e| MoodError::SampleFailure(format!("cannot start classifier thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(MoodError::SampleTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        Err(RecvTimeoutError::Disconnected) => {
            Err(MoodError::SampleFailure("classifier thread panicked".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{ScriptStep, ScriptedClassifier, SyntheticFrameSource};
    use crate::mood::Emotion;
    use std::time::Instant;

    fn fast_config(samples: usize) -> SamplingConfig {
        SamplingConfig {
            samples,
            interval_ms: 1,
            sample_timeout_ms: Some(500),
        }
    }

    fn scripted(steps: Vec<ScriptStep>) -> Arc<dyn MoodClassifier> {
        Arc::new(ScriptedClassifier::new(steps))
    }

    fn observe(label: Emotion, confidence: f64) -> ScriptStep {
        ScriptStep::Observe(Observation::new(label, confidence))
    }

    /// Frame source that yields nothing on chosen attempts.
    struct FlakyCamera {
        calls: usize,
        blank_on: Vec<usize>,
    }

    impl FrameSource for FlakyCamera {
        fn capture(&mut self) -> Result<Option<Frame>> {
            self.calls += 1;
            if self.blank_on.contains(&self.calls) {
                Ok(None)
            } else {
                Ok(Some(Frame::new(vec![1, 2, 3])))
            }
        }
    }

    struct DeniedCamera;

    impl FrameSource for DeniedCamera {
        fn capture(&mut self) -> Result<Option<Frame>> {
            Err(MoodError::DetectorUnavailable("permission denied".to_string()))
        }
    }

    #[test]
    fn test_default_config_matches_capture_flow() {
        let config = SamplingConfig::default();
        assert_eq!(config.samples, 3);
        assert_eq!(config.interval(), Duration::from_millis(300));
        assert_eq!(config.sample_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_collects_exactly_n_samples() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![
            observe(Emotion::Happy, 0.6),
            observe(Emotion::Happy, 0.8),
            observe(Emotion::Sad, 0.3),
            observe(Emotion::Angry, 0.9),
        ]);
        let mut frames = SyntheticFrameSource::new();

        let batch = sampler.collect(&mut frames, &classifier, &CancelToken::new()).unwrap();
        assert_eq!(batch.attempted, 3);
        assert_eq!(batch.dropped, 0);
        assert_eq!(batch.observations.len(), 3);
        assert_eq!(frames.captured(), 3);
    }

    #[test]
    fn test_capture_aggregates_batch() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![
            observe(Emotion::Happy, 0.6),
            observe(Emotion::Happy, 0.8),
            observe(Emotion::Sad, 0.3),
        ]);
        let capture = sampler
            .capture(&mut SyntheticFrameSource::new(), &classifier, &CancelToken::new())
            .unwrap();
        assert_eq!(capture.mood.label, Emotion::Happy);
        assert!((capture.mood.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_failed_samples_are_dropped() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![
            observe(Emotion::Sad, 0.2),
            ScriptStep::Fail("no face".to_string()),
            observe(Emotion::Happy, 0.9),
        ]);
        let capture = sampler
            .capture(&mut SyntheticFrameSource::new(), &classifier, &CancelToken::new())
            .unwrap();
        assert_eq!(capture.batch.dropped, 1);
        assert_eq!(capture.batch.observations.len(), 2);
        assert_eq!(capture.mood.label, Emotion::Sad);
    }

    #[test]
    fn test_missing_frames_are_dropped() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![observe(Emotion::Fearful, 0.05)]);
        let mut camera = FlakyCamera { calls: 0, blank_on: vec![1, 3] };

        let batch = sampler.collect(&mut camera, &classifier, &CancelToken::new()).unwrap();
        assert_eq!(batch.attempted, 3);
        assert_eq!(batch.dropped, 2);
        assert_eq!(batch.observations, vec![Observation::new(Emotion::Fearful, 0.05)]);
    }

    #[test]
    fn test_all_dropped_is_insufficient() {
        let sampler = Sampler::new(fast_config(2));
        let classifier = scripted(vec![]);
        let result = sampler.capture(&mut SyntheticFrameSource::new(), &classifier, &CancelToken::new());
        assert!(matches!(
            result,
            Err(MoodError::InsufficientSamples { required: 1, available: 0 })
        ));
    }

    #[test]
    fn test_detector_unavailable_aborts() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![observe(Emotion::Happy, 0.5)]);
        let result = sampler.collect(&mut DeniedCamera, &classifier, &CancelToken::new());
        assert!(matches!(result, Err(MoodError::DetectorUnavailable(_))));
    }

    #[test]
    fn test_slow_classifier_times_out() {
        let sampler = Sampler::new(SamplingConfig {
            samples: 2,
            interval_ms: 1,
            sample_timeout_ms: Some(20),
        });
        let classifier = scripted(vec![
            ScriptStep::Stall(Duration::from_millis(300), Observation::new(Emotion::Angry, 0.9)),
            observe(Emotion::Neutral, 0.3),
        ]);
        let start = Instant::now();
        let capture = sampler
            .capture(&mut SyntheticFrameSource::new(), &classifier, &CancelToken::new())
            .unwrap();

        assert!(start.elapsed() < Duration::from_millis(250), "Timeout should not wait for stalled classifier");
        assert_eq!(capture.batch.dropped, 1);
        assert_eq!(capture.mood.label, Emotion::Neutral);
    }

    #[test]
    fn test_cancel_before_start() {
        let sampler = Sampler::new(fast_config(3));
        let classifier = scripted(vec![observe(Emotion::Happy, 0.5)]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = sampler.collect(&mut SyntheticFrameSource::new(), &classifier, &cancel);
        assert!(matches!(result, Err(MoodError::Cancelled)));
    }

    #[test]
    fn test_cancel_wakes_pause() {
        let sampler = Sampler::new(SamplingConfig {
            samples: 3,
            interval_ms: 10_000,
            sample_timeout_ms: None,
        });
        let classifier = scripted(vec![
            observe(Emotion::Happy, 0.5),
            observe(Emotion::Happy, 0.5),
            observe(Emotion::Happy, 0.5),
        ]);
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });

        let start = Instant::now();
        let result = sampler.collect(&mut SyntheticFrameSource::new(), &classifier, &cancel);
        canceller.join().unwrap();

        assert!(matches!(result, Err(MoodError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5), "Cancellation must interrupt the pause");
    }

    #[test]
    fn test_cancel_during_final_attempt() {
        let sampler = Sampler::new(SamplingConfig {
            samples: 1,
            interval_ms: 1,
            sample_timeout_ms: Some(2_000),
        });
        let classifier = scripted(vec![ScriptStep::Stall(
            Duration::from_millis(200),
            Observation::new(Emotion::Happy, 0.9),
        )]);
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let result = sampler.capture(&mut SyntheticFrameSource::new(), &classifier, &cancel);
        canceller.join().unwrap();

        assert!(cancel.is_cancelled());
        assert!(
            matches!(result, Err(MoodError::Cancelled)),
            "A run cancelled mid-classification must not produce a mood"
        );
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = SamplingConfig::default().with_timeout_ms(0);
        assert_eq!(config.sample_timeout(), None);

        let config = SamplingConfig::default().with_timeout_ms(750);
        assert_eq!(config.sample_timeout(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_cancel_token_wait_times_out() {
        let token = CancelToken::new();
        assert!(!token.wait(Duration::from_millis(5)));
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait(Duration::from_secs(10)));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: SamplingConfig = serde_json::from_str(r#"{"samples": 5}"#).unwrap();
        assert_eq!(config.samples, 5);
        assert_eq!(config.interval_ms, 300);
        assert_eq!(config.sample_timeout_ms, Some(2_000));
    }
}
