//! User feedback on recommendations: a 1-5 rating and an optional comment,
//! stored alongside the mood history.

use crate::error::{MoodError, Result};
use crate::mood::Emotion;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: String,
    /// Mood the rated recommendations were for, if known.
    pub mood: Option<Emotion>,
    pub submitted_at: DateTime<Utc>,
}

impl Feedback {
    /// # Errors
    ///
    /// [`MoodError::InvalidRating`] unless `rating` is within 1..=5.
    pub fn new(rating: u8, comment: impl Into<String>, mood: Option<Emotion>) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(MoodError::InvalidRating(rating));
        }
        Ok(Self {
            rating,
            comment: comment.into().trim().to_string(),
            mood,
            submitted_at: Utc::now(),
        })
    }
}

/// Feedback table in the moodtune database.
#[derive(Debug)]
pub struct FeedbackStore {
    conn: Connection,
}

impl FeedbackStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS feedback (
                id           INTEGER PRIMARY KEY,
                rating       INTEGER NOT NULL,
                comment      TEXT    NOT NULL,
                mood         TEXT,
                submitted_at TEXT    NOT NULL
            )",
            (),
        )?;
        Ok(Self { conn })
    }

    pub fn submit(&self, feedback: &Feedback) -> Result<()> {
        self.conn.execute(
            "INSERT INTO feedback (rating, comment, mood, submitted_at) VALUES (?1, ?2, ?3, ?4)",
            (
                feedback.rating,
                &feedback.comment,
                feedback.mood.map(Emotion::as_str),
                feedback.submitted_at.to_rfc3339(),
            ),
        )?;
        info!("Feedback submitted: {} stars", feedback.rating);
        Ok(())
    }

    /// Every submission, oldest first.
    pub fn all(&self) -> Result<Vec<Feedback>> {
        let mut stmt = self
            .conn
            .prepare("SELECT rating, comment, mood, submitted_at FROM feedback ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u8>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut feedback = Vec::new();
        for row in rows {
            let (rating, comment, mood, submitted_at) = row?;
            let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    MoodError::Storage(rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    ))
                })?;
            feedback.push(Feedback {
                rating,
                comment,
                mood: mood.as_deref().map(Emotion::from_label_or_neutral),
                submitted_at,
            });
        }
        Ok(feedback)
    }

    /// Mean rating, or `None` before any feedback.
    pub fn average_rating(&self) -> Result<Option<f64>> {
        let average = self
            .conn
            .query_row("SELECT AVG(rating) FROM feedback", [], |row| row.get(0))?;
        Ok(average)
    }
}
