use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Track row carrying its stored embedding, as fetched for similarity search.
#[derive(Debug, Clone)]
pub struct EmbeddedTrack {
    pub id: Uuid,
    pub embedding: Vec<f32>,
    pub release_year: Option<i32>,
}

/// A vector-search hit: a track id plus its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub track_id: Uuid,
    pub similarity: f32,
    pub release_year: Option<i32>,
}

/// Audio-feature row used by the filter engine. Feature values are normalized
/// to 0.0-1.0 except tempo, which is in BPM.
#[derive(Debug, Clone, FromRow)]
pub struct TrackFeatures {
    pub id: Uuid,
    pub tempo: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub release_year: Option<i32>,
    pub explicit: bool,
}

/// Compact metadata used when formatting candidates for the ranking model.
#[derive(Debug, Clone, FromRow)]
pub struct TrackSummary {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
}
