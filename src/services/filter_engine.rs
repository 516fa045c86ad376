//! Enhanced Filter Engine
//!
//! Re-applies hard filters (explicit avoidance, era, audio features) to
//! vector candidates against storage, then enforces artist-repetition
//! diversity. Ordering is always by the original vector similarity; the only
//! permitted re-ordering is the tiered diversity shuffle.
//!
//! Diversity is best-effort: when the surviving pool is too small for the
//! requested limit, capped tracks are backfilled rather than dropped.

use crate::error::Result;
use crate::models::{SearchCandidate, SongSelectionCriteria, TrackFeatures};
use crate::repository::MusicRepository;
use crate::services::vector_search::tiered_shuffle_scaled;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct EnhancedFilterEngine {
    repository: Arc<dyn MusicRepository>,
}

impl EnhancedFilterEngine {
    pub fn new(repository: Arc<dyn MusicRepository>) -> Self {
        Self { repository }
    }

    pub async fn filter(
        &self,
        criteria: &SongSelectionCriteria,
        candidates: &[SearchCandidate],
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let mut rng = rand::rngs::StdRng::from_entropy();
        self.filter_with_rng(criteria, candidates, limit, &mut rng)
            .await
    }

    pub async fn filter_with_rng<R: Rng>(
        &self,
        criteria: &SongSelectionCriteria,
        candidates: &[SearchCandidate],
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Uuid>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.track_id).collect();
        let rows = self.repository.candidate_features(&ids).await?;

        // Year filtering only makes sense when the data can support it;
        // uniformly missing release dates skip the filter rather than
        // emptying the result
        let apply_year_filter = !criteria.year_ranges.is_empty()
            && self.repository.candidates_have_release_dates(&ids).await?;
        if !criteria.year_ranges.is_empty() && !apply_year_filter {
            debug!("No candidate has a release date, skipping year filter");
        }

        let similarities: HashMap<Uuid, f32> = candidates
            .iter()
            .map(|c| (c.track_id, c.similarity))
            .collect();

        let mut surviving: Vec<(Uuid, f32)> = rows
            .iter()
            .filter(|row| row_passes(row, criteria, apply_year_filter))
            .filter_map(|row| similarities.get(&row.id).map(|&s| (row.id, s)))
            .collect();
        surviving.sort_by(|a, b| b.1.total_cmp(&a.1));

        if let Some(factor) = criteria.diversity_factor {
            tiered_shuffle_scaled(&mut surviving, factor, rng);
        }

        let surviving_ids: Vec<Uuid> = surviving.iter().map(|(id, _)| *id).collect();
        let primary_artists = self.repository.primary_artists(&surviving_ids).await?;

        Ok(enforce_artist_cap(
            &surviving,
            &primary_artists,
            criteria.max_artist_repetition,
            limit,
        ))
    }
}

fn row_passes(row: &TrackFeatures, criteria: &SongSelectionCriteria, apply_year: bool) -> bool {
    if criteria.avoid_explicit && row.explicit {
        return false;
    }

    if apply_year {
        match row.release_year {
            Some(year) => {
                if !criteria.year_ranges.iter().any(|r| r.contains(year)) {
                    return false;
                }
            }
            None => return false,
        }
    }

    let bounds = &criteria.feature_bounds;
    within(row.tempo, bounds.tempo)
        && within(row.energy, bounds.energy)
        && within(row.danceability, bounds.danceability)
        && within(row.valence, bounds.valence)
        && within(row.acousticness, bounds.acousticness)
}

/// A missing feature value passes: absent analysis data is a data-quality
/// condition, not a reason to drop the track.
fn within(value: Option<f64>, bound: Option<(f64, f64)>) -> bool {
    match (value, bound) {
        (Some(v), Some((min, max))) => v >= min && v <= max,
        _ => true,
    }
}

/// Greedy walk over the similarity-sorted list admitting each track while its
/// primary artist stays under the cap. Tracks with no resolvable artist are
/// always admitted. If the walk under-fills the limit, capped tracks are
/// backfilled in order.
pub fn enforce_artist_cap(
    sorted: &[(Uuid, f32)],
    primary_artists: &HashMap<Uuid, Uuid>,
    max_per_artist: usize,
    limit: usize,
) -> Vec<Uuid> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    let mut selected = Vec::new();
    let mut capped = Vec::new();

    for (track_id, _) in sorted {
        if selected.len() >= limit {
            break;
        }
        match primary_artists.get(track_id) {
            Some(artist_id) => {
                let count = counts.entry(*artist_id).or_insert(0);
                if *count < max_per_artist {
                    *count += 1;
                    selected.push(*track_id);
                } else {
                    capped.push(*track_id);
                }
            }
            None => selected.push(*track_id),
        }
    }

    for track_id in capped {
        if selected.len() >= limit {
            break;
        }
        selected.push(track_id);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearRange;
    use crate::repository::mock::{MockCatalog, MockTrack};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidates_for(catalog: &MockCatalog) -> Vec<SearchCandidate> {
        catalog
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| SearchCandidate {
                track_id: t.id,
                similarity: 0.9 - (i as f32) * 0.05,
                release_year: t.release_year,
            })
            .collect()
    }

    #[tokio::test]
    async fn null_release_dates_skip_year_filter_entirely() {
        let catalog = Arc::new(MockCatalog::with_tracks(vec![
            MockTrack::new("a", "A"),
            MockTrack::new("b", "B"),
            MockTrack::new("c", "C"),
        ]));
        let candidates = candidates_for(&catalog);

        let mut with_filter = SongSelectionCriteria::new("test");
        with_filter.year_ranges = vec![YearRange { start: 1990, end: 1999 }];
        let mut without_filter = SongSelectionCriteria::new("test");
        without_filter.year_ranges = Vec::new();

        let engine = EnhancedFilterEngine::new(catalog.clone());
        let filtered = engine.filter(&with_filter, &candidates, 10).await.unwrap();
        let unfiltered = engine.filter(&without_filter, &candidates, 10).await.unwrap();
        assert_eq!(filtered, unfiltered);
        assert_eq!(filtered.len(), 3);
    }

    #[tokio::test]
    async fn year_filter_applies_when_dates_exist() {
        let catalog = Arc::new(MockCatalog::with_tracks(vec![
            MockTrack::new("nineties", "A").with_year(1994),
            MockTrack::new("eighties", "B").with_year(1985),
            MockTrack::new("undated", "C"),
        ]));
        let candidates = candidates_for(&catalog);

        let mut criteria = SongSelectionCriteria::new("test");
        criteria.year_ranges = vec![YearRange { start: 1990, end: 1999 }];

        let engine = EnhancedFilterEngine::new(catalog.clone());
        let result = engine.filter(&criteria, &candidates, 10).await.unwrap();
        assert_eq!(result, vec![catalog.tracks[0].id]);
    }

    #[tokio::test]
    async fn explicit_tracks_removed_when_avoidance_requested() {
        let catalog = Arc::new(MockCatalog::with_tracks(vec![
            MockTrack::new("clean", "A"),
            MockTrack::new("dirty", "B").explicit_content(),
        ]));
        let candidates = candidates_for(&catalog);

        let mut criteria = SongSelectionCriteria::new("test");
        criteria.avoid_explicit = true;

        let engine = EnhancedFilterEngine::new(catalog.clone());
        let result = engine.filter(&criteria, &candidates, 10).await.unwrap();
        assert_eq!(result, vec![catalog.tracks[0].id]);
    }

    #[tokio::test]
    async fn energy_bounds_filter_rows() {
        let catalog = Arc::new(MockCatalog::with_tracks(vec![
            MockTrack::new("hard", "A").with_energy(0.9),
            MockTrack::new("soft", "B").with_energy(0.2),
            MockTrack::new("unknown", "C"),
        ]));
        let candidates = candidates_for(&catalog);

        let mut criteria = SongSelectionCriteria::new("test");
        criteria.feature_bounds.energy = Some((0.7, 1.0));

        let engine = EnhancedFilterEngine::new(catalog.clone());
        let result = engine.filter(&criteria, &candidates, 10).await.unwrap();
        // High-energy track passes, missing analysis passes, low-energy fails
        assert!(result.contains(&catalog.tracks[0].id));
        assert!(result.contains(&catalog.tracks[2].id));
        assert!(!result.contains(&catalog.tracks[1].id));
    }

    #[tokio::test]
    async fn results_are_sorted_by_similarity() {
        let catalog = Arc::new(MockCatalog::with_tracks(vec![
            MockTrack::new("a", "A"),
            MockTrack::new("b", "B"),
            MockTrack::new("c", "C"),
        ]));
        // Feed candidates with ascending similarity, expect descending out
        let mut candidates = candidates_for(&catalog);
        candidates.reverse();

        let criteria = SongSelectionCriteria::new("test");
        let engine = EnhancedFilterEngine::new(catalog.clone());
        let result = engine.filter(&criteria, &candidates, 10).await.unwrap();
        assert_eq!(result[0], catalog.tracks[0].id);
    }

    #[test]
    fn artist_cap_limits_repetition() {
        let artist = Uuid::new_v4();
        let tracks: Vec<(Uuid, f32)> = (0..5)
            .map(|i| (Uuid::new_v4(), 1.0 - i as f32 * 0.1))
            .collect();
        let mapping: HashMap<Uuid, Uuid> = tracks.iter().map(|(id, _)| (*id, artist)).collect();

        let selected = enforce_artist_cap(&tracks, &mapping, 2, 3);
        // Cap of 2 for the only artist, then backfill to reach the limit
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0], tracks[0].0);
        assert_eq!(selected[1], tracks[1].0);
        assert_eq!(selected[2], tracks[2].0);
    }

    #[test]
    fn cap_holds_when_supply_is_plentiful() {
        let artist_a = Uuid::new_v4();
        let artist_b = Uuid::new_v4();
        let tracks: Vec<(Uuid, f32)> = (0..6)
            .map(|i| (Uuid::new_v4(), 1.0 - i as f32 * 0.1))
            .collect();
        let mut mapping = HashMap::new();
        for (i, (id, _)) in tracks.iter().enumerate() {
            mapping.insert(*id, if i < 4 { artist_a } else { artist_b });
        }

        let selected = enforce_artist_cap(&tracks, &mapping, 1, 2);
        assert_eq!(selected.len(), 2);
        // One per artist
        assert_eq!(mapping[&selected[0]], artist_a);
        assert_eq!(mapping[&selected[1]], artist_b);
    }

    #[test]
    fn unresolvable_artist_is_always_admitted() {
        let tracks: Vec<(Uuid, f32)> = (0..3).map(|i| (Uuid::new_v4(), 1.0 - i as f32 * 0.1)).collect();
        let mapping = HashMap::new();

        let selected = enforce_artist_cap(&tracks, &mapping, 1, 10);
        assert_eq!(selected.len(), 3);
    }

    #[tokio::test]
    async fn diversity_factor_shuffle_is_deterministic() {
        let tracks: Vec<MockTrack> = (0..12)
            .map(|i| MockTrack::new(&format!("t{}", i), &format!("artist{}", i)))
            .collect();
        let catalog = Arc::new(MockCatalog::with_tracks(tracks));
        let candidates = candidates_for(&catalog);

        let mut criteria = SongSelectionCriteria::new("test");
        criteria.diversity_factor = Some(0.8);

        let engine = EnhancedFilterEngine::new(catalog.clone());
        let a = engine
            .filter_with_rng(&criteria, &candidates, 12, &mut StdRng::seed_from_u64(9))
            .await
            .unwrap();
        let b = engine
            .filter_with_rng(&criteria, &candidates, 12, &mut StdRng::seed_from_u64(9))
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
