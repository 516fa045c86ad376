use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Inclusive release-year range, e.g. {1990, 1999} for "90s".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }
}

/// Desired energy window on the 0-100 prompt scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRange {
    pub min: f32,
    pub max: f32,
}

/// Optional min/max bounds per audio feature, on the track feature scale
/// (0.0-1.0 everywhere except tempo, which is BPM).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatureBounds {
    pub tempo: Option<(f64, f64)>,
    pub energy: Option<(f64, f64)>,
    pub danceability: Option<(f64, f64)>,
    pub valence: Option<(f64, f64)>,
    pub acousticness: Option<(f64, f64)>,
}

impl AudioFeatureBounds {
    pub fn is_empty(&self) -> bool {
        self.tempo.is_none()
            && self.energy.is_none()
            && self.danceability.is_none()
            && self.valence.is_none()
            && self.acousticness.is_none()
    }
}

/// Resolved selection criteria consumed by vector search and filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongSelectionCriteria {
    /// Original prompt text, kept for building the embedding description.
    pub query_text: String,
    pub explicit_artist_ids: Vec<Uuid>,
    pub explicit_genre_ids: Vec<Uuid>,
    /// Genre names that survived resolution, used for description building.
    pub genre_names: Vec<String>,
    pub year_ranges: Vec<YearRange>,
    pub mood_weights: HashMap<String, f32>,
    pub energy_range: Option<EnergyRange>,
    pub feature_bounds: AudioFeatureBounds,
    pub vector_similarity_weight: f32,
    pub max_artist_repetition: usize,
    pub avoid_explicit: bool,
    /// 0.0-1.0; when set, the filter engine re-applies tiered shuffling at
    /// this magnitude.
    pub diversity_factor: Option<f32>,
}

impl SongSelectionCriteria {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            explicit_artist_ids: Vec::new(),
            explicit_genre_ids: Vec::new(),
            genre_names: Vec::new(),
            year_ranges: Vec::new(),
            mood_weights: HashMap::new(),
            energy_range: None,
            feature_bounds: AudioFeatureBounds::default(),
            vector_similarity_weight: 1.0,
            max_artist_repetition: 3,
            avoid_explicit: false,
            diversity_factor: None,
        }
    }
}
