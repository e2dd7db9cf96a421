//! # Mood Model
//!
//! The closed set of emotions moodtune understands, plus the two records
//! that flow through capture: a single [`Observation`] from one detection
//! attempt and the consolidated [`AggregatedMood`] for a whole batch.
//!
//! Confidence values are clamped into `[0, 1]` on construction so every
//! downstream mean stays in range.

use crate::error::MoodError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emotion tags produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Surprised,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fearful => "fearful",
            Self::Surprised => "surprised",
        }
    }

    /// Sentence shown to the user once a mood has been detected.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Happy => "You seem to be in a great mood! We'll suggest upbeat, energetic music to keep your positive vibes going.",
            Self::Sad => "We detect that you might be feeling down. We'll suggest some comforting music that can help express or lift your mood.",
            Self::Angry => "You seem to have some intense energy! We'll suggest music that can help you process or channel those feelings.",
            Self::Fearful => "We sense some anxiety or worry. We'll suggest calming music that might help reduce stress and promote relaxation.",
            Self::Surprised => "You seem surprised or excited! We'll suggest some dynamic and interesting tracks to match your energy.",
            Self::Neutral => "Your mood seems balanced. We'll suggest a mix of music styles that might resonate with you right now.",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Sad => "😢",
            Self::Angry => "😠",
            Self::Fearful => "😨",
            Self::Surprised => "😮",
            Self::Neutral => "😐",
        }
    }

    /// Style class for front-ends; surprised shares the joyful palette.
    #[must_use]
    pub const fn color_class(self) -> &'static str {
        match self {
            Self::Happy | Self::Surprised => "mood-joy",
            Self::Sad => "mood-sad",
            Self::Angry => "mood-angry",
            Self::Fearful => "mood-fear",
            Self::Neutral => "mood-neutral",
        }
    }

    /// Parse a free-text label, falling back to neutral for anything unknown.
    #[must_use]
    pub fn from_label_or_neutral(label: &str) -> Self {
        label.parse().unwrap_or(Self::Neutral)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            // Disgust is folded into anger.
            "angry" | "disgusted" => Ok(Self::Angry),
            "fearful" => Ok(Self::Fearful),
            "surprised" => Ok(Self::Surprised),
            other => Err(MoodError::UnknownEmotion(other.to_string())),
        }
    }
}

/// Clamp into `[0, 1]`; NaN becomes 0.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One raw reading from a single detection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: Emotion,
    pub confidence: f64,
}

impl Observation {
    #[must_use]
    pub fn new(label: Emotion, confidence: f64) -> Self {
        Self {
            label,
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Consolidated decision for a batch of observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMood {
    pub label: Emotion,
    pub confidence: f64,
}

impl AggregatedMood {
    #[must_use]
    pub fn new(label: Emotion, confidence: f64) -> Self {
        Self {
            label,
            confidence: clamp_confidence(confidence),
        }
    }

    /// Reading handed to callers when no usable sample was collected.
    #[must_use]
    pub const fn neutral_default() -> Self {
        Self {
            label: Emotion::Neutral,
            confidence: 0.5,
        }
    }

    /// Confidence as a whole percentage, the way it is displayed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.confidence * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("happy".parse::<Emotion>().unwrap(), Emotion::Happy);
        assert_eq!(" Sad ".parse::<Emotion>().unwrap(), Emotion::Sad);
        assert_eq!("DISGUSTED".parse::<Emotion>().unwrap(), Emotion::Angry);
        assert!(matches!(
            "bored".parse::<Emotion>(),
            Err(MoodError::UnknownEmotion(label)) if label == "bored"
        ));
    }

    #[test]
    fn test_display_round_trips_every_label() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.to_string().parse::<Emotion>().unwrap(), emotion);
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_neutral() {
        assert_eq!(Emotion::from_label_or_neutral("ecstatic"), Emotion::Neutral);
        assert_eq!(Emotion::from_label_or_neutral("Fearful"), Emotion::Fearful);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Observation::new(Emotion::Happy, 1.7).confidence, 1.0);
        assert_eq!(Observation::new(Emotion::Happy, -0.2).confidence, 0.0);
        assert_eq!(Observation::new(Emotion::Happy, f64::NAN).confidence, 0.0);
        assert_eq!(AggregatedMood::new(Emotion::Sad, 3.0).confidence, 1.0);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(AggregatedMood::new(Emotion::Happy, 0.7).percent(), 70);
        assert_eq!(AggregatedMood::new(Emotion::Happy, 0.666).percent(), 67);
        assert_eq!(AggregatedMood::neutral_default().percent(), 50);
    }

    #[test]
    fn test_presentation_tables() {
        assert_eq!(Emotion::Surprised.color_class(), Emotion::Happy.color_class());
        assert_eq!(Emotion::Fearful.color_class(), "mood-fear");
        assert!(Emotion::Neutral.description().contains("balanced"));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Emotion::Surprised).unwrap();
        assert_eq!(json, "\"surprised\"");
        let parsed: Emotion = serde_json::from_str("\"angry\"").unwrap();
        assert_eq!(parsed, Emotion::Angry);
    }
}
