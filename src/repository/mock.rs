//! In-memory catalog used by unit tests in place of Postgres.

use crate::error::{AppError, Result};
use crate::models::{EmbeddedTrack, TrackFeatures, TrackSummary};
use crate::repository::{CriteriaQuery, MusicRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MockTrack {
    pub id: Uuid,
    pub title: String,
    pub artist_name: String,
    pub genres: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub tempo: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub release_year: Option<i32>,
    pub explicit: bool,
}

impl MockTrack {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist_name: artist.to_string(),
            genres: Vec::new(),
            embedding: None,
            tempo: None,
            energy: None,
            danceability: None,
            valence: None,
            acousticness: None,
            release_year: None,
            explicit: false,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genres.push(genre.to_string());
        self
    }

    pub fn explicit_content(mut self) -> Self {
        self.explicit = true;
        self
    }
}

#[derive(Default)]
pub struct MockCatalog {
    pub tracks: Vec<MockTrack>,
    pub artist_ids: HashMap<String, Uuid>,
    pub genre_ids: HashMap<String, Uuid>,
    /// When set, text search errors out to exercise fallback chains.
    pub fail_text_search: bool,
    /// When set, random sampling errors out to exercise the any-rows fallback.
    pub fail_random: bool,
}

impl MockCatalog {
    pub fn with_tracks(tracks: Vec<MockTrack>) -> Self {
        let mut catalog = Self::default();
        for track in &tracks {
            catalog
                .artist_ids
                .entry(track.artist_name.to_lowercase())
                .or_insert_with(Uuid::new_v4);
            for genre in &track.genres {
                catalog
                    .genre_ids
                    .entry(genre.to_lowercase())
                    .or_insert_with(Uuid::new_v4);
            }
        }
        catalog.tracks = tracks;
        catalog
    }

    fn primary_artist_id(&self, track: &MockTrack) -> Option<Uuid> {
        self.artist_ids.get(&track.artist_name.to_lowercase()).copied()
    }
}

#[async_trait]
impl MusicRepository for MockCatalog {
    async fn artist_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .tracks
            .iter()
            .map(|t| t.artist_name.clone())
            .collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        names.dedup();
        Ok(names)
    }

    async fn find_artist_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>> {
        Ok(names
            .iter()
            .filter_map(|n| self.artist_ids.get(&n.to_lowercase()).copied())
            .collect())
    }

    async fn find_genre_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>> {
        Ok(names
            .iter()
            .filter_map(|n| self.genre_ids.get(&n.to_lowercase()).copied())
            .collect())
    }

    async fn embedded_tracks(
        &self,
        limit: usize,
        avoid_explicit: bool,
    ) -> Result<Vec<EmbeddedTrack>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.embedding.is_some() && !(avoid_explicit && t.explicit))
            .take(limit)
            .map(|t| EmbeddedTrack {
                id: t.id,
                embedding: t.embedding.clone().unwrap(),
                release_year: t.release_year,
            })
            .collect())
    }

    async fn candidate_features(&self, ids: &[Uuid]) -> Result<Vec<TrackFeatures>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(|t| TrackFeatures {
                id: t.id,
                tempo: t.tempo,
                energy: t.energy,
                danceability: t.danceability,
                valence: t.valence,
                acousticness: t.acousticness,
                release_year: t.release_year,
                explicit: t.explicit,
            })
            .collect())
    }

    async fn candidates_have_release_dates(&self, ids: &[Uuid]) -> Result<bool> {
        Ok(self
            .tracks
            .iter()
            .any(|t| ids.contains(&t.id) && t.release_year.is_some()))
    }

    async fn primary_artists(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Uuid>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .filter_map(|t| self.primary_artist_id(t).map(|a| (t.id, a)))
            .collect())
    }

    async fn search_tracks_text(&self, query: &str, limit: usize) -> Result<Vec<Uuid>> {
        if self.fail_text_search {
            return Err(AppError::NotFound("text search unavailable".into()));
        }
        let query = query.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| {
                query
                    .split_whitespace()
                    .any(|w| t.title.to_lowercase().contains(w))
            })
            .take(limit)
            .map(|t| t.id)
            .collect())
    }

    async fn search_tracks_substring(&self, query: &str, limit: usize) -> Result<Vec<Uuid>> {
        let query = query.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&query)
                    || t.artist_name.to_lowercase().contains(&query)
            })
            .take(limit)
            .map(|t| t.id)
            .collect())
    }

    async fn tracks_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Uuid>> {
        let genre = genre.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.genres.iter().any(|g| g.to_lowercase() == genre))
            .take(limit)
            .map(|t| t.id)
            .collect())
    }

    async fn tracks_by_artist(&self, artist: &str, limit: usize) -> Result<Vec<Uuid>> {
        let artist = artist.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.artist_name.to_lowercase() == artist)
            .take(limit)
            .map(|t| t.id)
            .collect())
    }

    async fn tracks_by_criteria(&self, query: &CriteriaQuery, limit: usize) -> Result<Vec<Uuid>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| {
                let genre_ok = query.genres.is_empty()
                    || t.genres
                        .iter()
                        .any(|g| query.genres.iter().any(|q| q.eq_ignore_ascii_case(g)));
                let year_ok = match (query.year_range, t.release_year) {
                    (Some((min, max)), Some(year)) => year >= min && year <= max,
                    (Some(_), None) => false,
                    (None, _) => true,
                };
                let energy_ok = match (query.energy_range, t.energy) {
                    (Some((min, max)), Some(energy)) => energy >= min && energy <= max,
                    _ => true,
                };
                genre_ok && year_ok && energy_ok
            })
            .take(limit)
            .map(|t| t.id)
            .collect())
    }

    async fn random_tracks(&self, limit: usize) -> Result<Vec<Uuid>> {
        if self.fail_random {
            return Err(AppError::NotFound("random ordering unavailable".into()));
        }
        Ok(self.tracks.iter().take(limit).map(|t| t.id).collect())
    }

    async fn any_tracks(&self, limit: usize) -> Result<Vec<Uuid>> {
        Ok(self.tracks.iter().take(limit).map(|t| t.id).collect())
    }

    async fn track_count(&self) -> Result<i64> {
        Ok(self.tracks.len() as i64)
    }

    async fn track_summaries(&self, ids: &[Uuid]) -> Result<Vec<TrackSummary>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(|t| TrackSummary {
                id: t.id,
                title: t.title.clone(),
                artist: t.artist_name.clone(),
                year: t.release_year,
            })
            .collect())
    }
}
