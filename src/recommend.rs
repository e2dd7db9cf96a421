//! # Recommendation Module
//!
//! Maps a detected mood to a shuffled list of songs.
//!
//! The built-in catalog holds four hand-picked tracks per emotion. Each
//! request returns the mood's list in a fresh random order, so asking again
//! ("refresh") gives a different running order.

use crate::error::Result;
use crate::mood::Emotion;
use lazy_static::lazy_static;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// A recommended track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album_art: String,
    /// Where the track can be played, e.g. `Spotify` or `YouTube`.
    pub source: String,
    pub genre: String,
    pub external_url: String,
}

/// Anything that can turn a mood into songs.
pub trait RecommendationSource {
    /// Songs suited to `mood`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be reached.
    fn recommend(&self, mood: Emotion) -> Result<Vec<Song>>;
}

const ART: &str = "https://images.pexels.com/photos";

fn song(id: &str, title: &str, artist: &str, art: &str, source: &str, genre: &str, url: &str) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        album_art: format!("{ART}/{art}?auto=compress&cs=tinysrgb&w=300"),
        source: source.to_string(),
        genre: genre.to_string(),
        external_url: url.to_string(),
    }
}

lazy_static! {
    static ref CATALOG: HashMap<Emotion, Vec<Song>> = {
        let mut catalog = HashMap::new();
        catalog.insert(Emotion::Happy, vec![
            song("h1", "Happy", "Pharrell Williams", "144429/pexels-photo-144429.jpeg", "Spotify", "Pop", "https://open.spotify.com/track/60nZcImufyMA1MKQY3dcCO"),
            song("h2", "Can't Stop the Feeling!", "Justin Timberlake", "167092/pexels-photo-167092.jpeg", "YouTube", "Pop", "https://www.youtube.com/watch?v=ru0K8uYEZWw"),
            song("h3", "Uptown Funk", "Mark Ronson ft. Bruno Mars", "33597/guitar-classical-guitar-acoustic-guitar-electric-guitar.jpg", "Spotify", "Funk/Pop", "https://open.spotify.com/track/32OlwWuMpZ6b0aN2RZOeMS"),
            song("h4", "Good as Hell", "Lizzo", "1105666/pexels-photo-1105666.jpeg", "YouTube", "Pop/R&B", "https://www.youtube.com/watch?v=SmbmeOgWsqE"),
        ]);
        catalog.insert(Emotion::Sad, vec![
            song("s1", "Someone Like You", "Adele", "1699161/pexels-photo-1699161.jpeg", "Spotify", "Pop/Soul", "https://open.spotify.com/track/4kflIGfjdZJW4ot2ioixTB"),
            song("s2", "Fix You", "Coldplay", "1105666/pexels-photo-1105666.jpeg", "YouTube", "Alternative Rock", "https://www.youtube.com/watch?v=k4V3Mo61fJM"),
            song("s3", "All I Want", "Kodaline", "1021876/pexels-photo-1021876.jpeg", "Spotify", "Indie Rock", "https://open.spotify.com/track/2tznHmp70DxMyr2XhWLOW0"),
            song("s4", "Skinny Love", "Bon Iver", "164821/pexels-photo-164821.jpeg", "YouTube", "Indie Folk", "https://www.youtube.com/watch?v=ssdgFoHLwnk"),
        ]);
        catalog.insert(Emotion::Angry, vec![
            song("a1", "Killing In The Name", "Rage Against The Machine", "164693/pexels-photo-164693.jpeg", "Spotify", "Rock/Metal", "https://open.spotify.com/track/59WN2psjkt1tyaxjspN8fp"),
            song("a2", "Break Stuff", "Limp Bizkit", "33779/hand-microphone-mic-hold.jpg", "YouTube", "Nu Metal", "https://www.youtube.com/watch?v=ZpUYjpKg9KY"),
            song("a3", "Bulls On Parade", "Rage Against The Machine", "89909/pexels-photo-89909.jpeg", "Spotify", "Rock/Metal", "https://open.spotify.com/track/1EcOzxfCsMEooKTAtDNOHF"),
            song("a4", "Du Hast", "Rammstein", "210922/pexels-photo-210922.jpeg", "YouTube", "Industrial Metal", "https://www.youtube.com/watch?v=W3q8Od5qJio"),
        ]);
        catalog.insert(Emotion::Fearful, vec![
            song("f1", "Everybody Wants To Rule The World", "Tears For Fears", "1021876/pexels-photo-1021876.jpeg", "Spotify", "New Wave", "https://open.spotify.com/track/4RvWPyQ5RL0ao9LPZeSouE"),
            song("f2", "Breathe Me", "Sia", "1699161/pexels-photo-1699161.jpeg", "YouTube", "Pop/Indie", "https://www.youtube.com/watch?v=ghPcYqn0p4Y"),
            song("f3", "Hurt", "Johnny Cash", "1047442/pexels-photo-1047442.jpeg", "Spotify", "Country/Rock", "https://open.spotify.com/track/28cnXtME493VX9NOw9cIUh"),
            song("f4", "Mad World", "Gary Jules", "34221/violin-musical-instrument-music-sound.jpg", "YouTube", "Alternative", "https://www.youtube.com/watch?v=4N3N1MlvVc4"),
        ]);
        catalog.insert(Emotion::Neutral, vec![
            song("n1", "Clocks", "Coldplay", "1105666/pexels-photo-1105666.jpeg", "Spotify", "Alternative Rock", "https://open.spotify.com/track/0BCPKOYdS2jbQ8iyB56Zns"),
            song("n2", "Reminder", "The Weeknd", "1699161/pexels-photo-1699161.jpeg", "YouTube", "R&B/Pop", "https://www.youtube.com/watch?v=JZjAg6fK-BQ"),
            song("n3", "Dreams", "Fleetwood Mac", "33597/guitar-classical-guitar-acoustic-guitar-electric-guitar.jpg", "Spotify", "Rock", "https://open.spotify.com/track/0ofHAoxe9vBkTCp2UQIavz"),
            song("n4", "Watermelon Sugar", "Harry Styles", "1699161/pexels-photo-1699161.jpeg", "YouTube", "Pop", "https://www.youtube.com/watch?v=E07s5ZYygMg"),
        ]);
        catalog.insert(Emotion::Surprised, vec![
            song("su1", "Wow.", "Post Malone", "33779/hand-microphone-mic-hold.jpg", "Spotify", "Hip-Hop", "https://open.spotify.com/track/7xQAfvXzm3AkraOtGPWIZg"),
            song("su2", "Supermassive Black Hole", "Muse", "1763075/pexels-photo-1763075.jpeg", "YouTube", "Alternative Rock", "https://www.youtube.com/watch?v=OgvLej8ln2w"),
            song("su3", "What Do You Mean?", "Justin Bieber", "167092/pexels-photo-167092.jpeg", "Spotify", "Pop", "https://open.spotify.com/track/3dEjWRteBznPmdSLUaUXFi"),
            song("su4", "Poker Face", "Lady Gaga", "1699161/pexels-photo-1699161.jpeg", "YouTube", "Pop", "https://www.youtube.com/watch?v=bESGLojNYSo"),
        ]);
        catalog
    };
}

/// Catalog songs for `mood`, in catalog order.
#[must_use]
pub fn catalog_songs(mood: Emotion) -> &'static [Song] {
    CATALOG.get(&mood).map_or(&[] as &[Song], Vec::as_slice)
}

/// Recommender over the built-in catalog.
#[derive(Debug)]
pub struct CatalogRecommender {
    rng: Mutex<StdRng>,
    limit: Option<usize>,
}

impl CatalogRecommender {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            limit: None,
        }
    }

    /// Deterministic shuffles for reproducible output.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Recommend for a free-text label; unknown labels get neutral songs.
    pub fn recommend_label(&self, label: &str) -> Result<Vec<Song>> {
        self.recommend(Emotion::from_label_or_neutral(label))
    }
}

impl Default for CatalogRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationSource for CatalogRecommender {
    fn recommend(&self, mood: Emotion) -> Result<Vec<Song>> {
        info!("Getting recommendations for mood: {mood}");
        let mut songs = catalog_songs(mood).to_vec();

        // Fisher-Yates.
        match self.rng.lock() {
            Ok(mut rng) => songs.shuffle(&mut *rng),
            Err(_) => songs.shuffle(&mut rand::thread_rng()),
        }

        if let Some(limit) = self.limit {
            songs.truncate(limit);
        }
        debug!("Recommended {} songs for {mood}", songs.len());
        Ok(songs)
    }
}
