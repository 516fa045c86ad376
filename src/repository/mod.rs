#[cfg(test)]
pub mod mock;
pub mod postgres;

use crate::error::Result;
use crate::models::{EmbeddedTrack, TrackFeatures, TrackSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

pub use postgres::PgMusicRepository;

/// Structured filters for the criteria retrieval strategy.
#[derive(Debug, Clone, Default)]
pub struct CriteriaQuery {
    pub genres: Vec<String>,
    pub year_range: Option<(i32, i32)>,
    pub energy_range: Option<(f64, f64)>,
}

/// Read-only access to the music catalog. Everything the selection pipeline
/// needs from storage goes through here so ranking and filtering logic stays
/// free of query building.
#[async_trait]
pub trait MusicRepository: Send + Sync {
    /// All known artist names, longest first, for substring-safe matching.
    async fn artist_names(&self) -> Result<Vec<String>>;

    /// Case-insensitive exact name resolution.
    async fn find_artist_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>>;

    /// Case-insensitive exact name resolution.
    async fn find_genre_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>>;

    /// Tracks with a non-null embedding, optionally excluding explicit ones.
    async fn embedded_tracks(
        &self,
        limit: usize,
        avoid_explicit: bool,
    ) -> Result<Vec<EmbeddedTrack>>;

    /// Audio-feature rows for a candidate id set.
    async fn candidate_features(&self, ids: &[Uuid]) -> Result<Vec<TrackFeatures>>;

    /// Whether any of the given candidates has a release date in storage.
    async fn candidates_have_release_dates(&self, ids: &[Uuid]) -> Result<bool>;

    /// Primary (first-listed) artist per track. Tracks without an artist row
    /// are absent from the map.
    async fn primary_artists(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Uuid>>;

    /// Full-text search over title/artist/album metadata.
    async fn search_tracks_text(&self, query: &str, limit: usize) -> Result<Vec<Uuid>>;

    /// Plain substring match on title or artist name.
    async fn search_tracks_substring(&self, query: &str, limit: usize) -> Result<Vec<Uuid>>;

    async fn tracks_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Uuid>>;

    async fn tracks_by_artist(&self, artist: &str, limit: usize) -> Result<Vec<Uuid>>;

    async fn tracks_by_criteria(&self, query: &CriteriaQuery, limit: usize) -> Result<Vec<Uuid>>;

    /// Uniformly random sample of track ids.
    async fn random_tracks(&self, limit: usize) -> Result<Vec<Uuid>>;

    /// Any rows at all, no ordering guarantees. Last-resort fallback.
    async fn any_tracks(&self, limit: usize) -> Result<Vec<Uuid>>;

    async fn track_count(&self) -> Result<i64>;

    /// Compact metadata for formatting candidates in model prompts.
    async fn track_summaries(&self, ids: &[Uuid]) -> Result<Vec<TrackSummary>>;
}
