//! # Detector Module
//!
//! Everything upstream of aggregation: where frames come from and how a
//! single frame turns into one [`Observation`].
//!
//! ## Seams
//!
//! - [`FrameSource`] - a camera, a still image on disk, or synthetic frames
//! - [`MoodClassifier`] - turns one frame into one observation
//!
//! The shipped [`RandomClassifier`] draws expression scores at random and
//! stands in for real facial-expression inference. Swapping in a real model
//! means implementing [`MoodClassifier`]; the sampler and aggregator stay
//! unchanged.

use crate::error::{MoodError, Result};
use crate::mood::{Emotion, Observation};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One still capture handed to the classifier.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded image bytes, shared between copies of the same capture.
    pub data: Arc<Vec<u8>>,
    pub captured_at: Instant,
}

impl Frame {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            captured_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.data.is_empty()
    }
}

/// Supplier of frames, one per sampling attempt.
///
/// `Ok(None)` means the device is there but produced nothing this time;
/// the sampler drops that attempt. Errors of kind
/// [`MoodError::DetectorUnavailable`] abort the whole capture.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Option<Frame>>;
}

/// Serves copies of one image file read at construction.
#[derive(Debug)]
pub struct StillImageSource {
    path: PathBuf,
    frame: Frame,
}

impl StillImageSource {
    /// # Errors
    ///
    /// [`MoodError::DetectorUnavailable`] if the file is missing, unreadable
    /// or empty.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| {
            MoodError::DetectorUnavailable(format!("cannot read image {}: {e}", path.display()))
        })?;
        if data.is_empty() {
            return Err(MoodError::DetectorUnavailable(format!(
                "image {} is empty",
                path.display()
            )));
        }
        info!("Using still image {} ({} bytes)", path.display(), data.len());
        Ok(Self {
            path: path.to_path_buf(),
            frame: Frame::new(data),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for StillImageSource {
    fn capture(&mut self) -> Result<Option<Frame>> {
        Ok(Some(Frame {
            data: Arc::clone(&self.frame.data),
            captured_at: Instant::now(),
        }))
    }
}

/// Blank frames, for classifiers that ignore pixel data.
#[derive(Debug, Default)]
pub struct SyntheticFrameSource {
    captured: usize,
}

impl SyntheticFrameSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn captured(&self) -> usize {
        self.captured
    }
}

impl FrameSource for SyntheticFrameSource {
    fn capture(&mut self) -> Result<Option<Frame>> {
        self.captured += 1;
        Ok(Some(Frame::new(Vec::new())))
    }
}

/// Single-observation detector.
pub trait MoodClassifier: Send + Sync {
    /// Classify one frame.
    ///
    /// # Errors
    ///
    /// [`MoodError::SampleFailure`] when no face or expression could be read.
    fn classify(&self, frame: &Frame) -> Result<Observation>;

    /// Load models or otherwise prepare. Called once before sampling.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}

/// Raw scores of a seven-way facial expression model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressionScores {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
}

impl ExpressionScores {
    /// Scores in model output order, with the emotion each maps to.
    #[must_use]
    pub fn mapped(&self) -> [(Emotion, f64); 7] {
        [
            (Emotion::Neutral, self.neutral),
            (Emotion::Happy, self.happy),
            (Emotion::Sad, self.sad),
            (Emotion::Angry, self.angry),
            (Emotion::Fearful, self.fearful),
            (Emotion::Angry, self.disgusted),
            (Emotion::Surprised, self.surprised),
        ]
    }

    /// Highest-scoring expression as an observation.
    ///
    /// Scans in model order with a strictly-greater comparison starting from
    /// neutral at zero, so all-zero scores read as neutral with confidence 0.
    #[must_use]
    pub fn dominant(&self) -> Observation {
        let (label, confidence) = self
            .mapped()
            .into_iter()
            .fold((Emotion::Neutral, 0.0), |best, (label, score)| {
                if score > best.1 {
                    (label, score)
                } else {
                    best
                }
            });
        Observation::new(label, confidence)
    }
}

/// Upper bounds of the uniform draws, per expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionCaps(pub ExpressionScores);

impl Default for ExpressionCaps {
    fn default() -> Self {
        Self(ExpressionScores {
            neutral: 0.5,
            happy: 0.8,
            sad: 0.3,
            angry: 0.2,
            fearful: 0.1,
            disgusted: 0.1,
            surprised: 0.2,
        })
    }
}

/// Mock detector drawing each expression uniformly from `[0, cap)`.
#[derive(Debug)]
pub struct RandomClassifier {
    rng: Mutex<StdRng>,
    caps: ExpressionCaps,
    latency: Duration,
    warm_up_delay: Duration,
}

impl RandomClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            caps: ExpressionCaps::default(),
            latency: Duration::ZERO,
            warm_up_delay: Duration::ZERO,
        }
    }

    /// Simulated per-detection and model-loading delays.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration, warm_up_delay: Duration) -> Self {
        self.latency = latency;
        self.warm_up_delay = warm_up_delay;
        self
    }

    #[must_use]
    pub fn with_caps(mut self, caps: ExpressionCaps) -> Self {
        self.caps = caps;
        self
    }

    fn draw(rng: &mut StdRng, cap: f64) -> f64 {
        if cap <= 0.0 {
            0.0
        } else {
            rng.gen_range(0.0..cap)
        }
    }

    /// Draw one set of expression scores.
    pub fn sample_scores(&self) -> Result<ExpressionScores> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| MoodError::SampleFailure("random source poisoned".to_string()))?;
        let caps = self.caps.0;
        Ok(ExpressionScores {
            neutral: Self::draw(&mut rng, caps.neutral),
            happy: Self::draw(&mut rng, caps.happy),
            sad: Self::draw(&mut rng, caps.sad),
            angry: Self::draw(&mut rng, caps.angry),
            fearful: Self::draw(&mut rng, caps.fearful),
            disgusted: Self::draw(&mut rng, caps.disgusted),
            surprised: Self::draw(&mut rng, caps.surprised),
        })
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodClassifier for RandomClassifier {
    fn classify(&self, frame: &Frame) -> Result<Observation> {
        let scores = self.sample_scores()?;
        trace!("Expression scores for {}-byte frame: {scores:?}", frame.data.len());
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok(scores.dominant())
    }

    fn warm_up(&self) -> Result<()> {
        debug!("Loading expression models...");
        if !self.warm_up_delay.is_zero() {
            std::thread::sleep(self.warm_up_delay);
        }
        debug!("Expression models loaded");
        Ok(())
    }
}

/// One scripted classifier reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Observe(Observation),
    Fail(String),
    /// Sleep, then reply. Exercises the sampler's timeout.
    Stall(Duration, Observation),
}

/// Replays a fixed sequence of replies, then fails every further call.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    steps: Mutex<VecDeque<ScriptStep>>,
}

impl ScriptedClassifier {
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
        }
    }

    #[must_use]
    pub fn observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self::new(observations.into_iter().map(ScriptStep::Observe))
    }

    /// Parse `happy:0.6,sad:0.3,fail` style scripts.
    ///
    /// # Errors
    ///
    /// [`MoodError::UnknownEmotion`] for a bad label or confidence.
    pub fn parse(script: &str) -> Result<Self> {
        let steps = script
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|step| {
                if step.eq_ignore_ascii_case("fail") {
                    return Ok(ScriptStep::Fail("scripted failure".to_string()));
                }
                let (label, confidence) = step
                    .split_once(':')
                    .ok_or_else(|| MoodError::UnknownEmotion(step.to_string()))?;
                let confidence: f64 = confidence
                    .trim()
                    .parse()
                    .map_err(|_| MoodError::UnknownEmotion(step.to_string()))?;
                Ok(ScriptStep::Observe(Observation::new(label.parse()?, confidence)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(steps))
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl MoodClassifier for ScriptedClassifier {
    fn classify(&self, _frame: &Frame) -> Result<Observation> {
        let step = self
            .steps
            .lock()
            .map_err(|_| MoodError::SampleFailure("script poisoned".to_string()))?
            .pop_front();
        match step {
            Some(ScriptStep::Observe(observation)) => Ok(observation),
            Some(ScriptStep::Fail(reason)) => Err(MoodError::SampleFailure(reason)),
            Some(ScriptStep::Stall(delay, observation)) => {
                std::thread::sleep(delay);
                Ok(observation)
            }
            None => Err(MoodError::SampleFailure("script exhausted".to_string())),
        }
    }
}
