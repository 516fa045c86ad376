//! Vector Search Engine
//!
//! Embeds a natural-language description of the resolved criteria, scores
//! stored track embeddings by cosine similarity, applies an adaptive
//! threshold cascade, and injects tiered randomization so playlists aren't
//! identical between runs. The random source is injectable for tests.

use crate::error::Result;
use crate::models::{SearchCandidate, SongSelectionCriteria};
use crate::providers::EmbeddingProvider;
use crate::repository::MusicRepository;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MIN_DESCRIPTION_LEN: usize = 10;
const MAX_CANDIDATE_FETCH: usize = 500;

pub struct VectorSearchEngine {
    embeddings: Arc<dyn EmbeddingProvider>,
    repository: Arc<dyn MusicRepository>,
}

impl VectorSearchEngine {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        repository: Arc<dyn MusicRepository>,
    ) -> Self {
        Self { embeddings, repository }
    }

    pub async fn search(
        &self,
        criteria: &SongSelectionCriteria,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        let mut rng = rand::rngs::StdRng::from_entropy();
        self.search_with_rng(criteria, limit, &mut rng).await
    }

    pub async fn search_with_rng<R: Rng>(
        &self,
        criteria: &SongSelectionCriteria,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<SearchCandidate>> {
        let description = build_search_description(criteria);
        if description.len() < MIN_DESCRIPTION_LEN {
            debug!("Search description too short, skipping embedding call");
            return Ok(Vec::new());
        }

        let query_embedding = match self.embeddings.embed(&description).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Embedding provider failed, returning no vector candidates: {}", e);
                return Ok(Vec::new());
            }
        };

        let fetch_limit = MAX_CANDIDATE_FETCH.min(limit.saturating_mul(10));
        let tracks = self
            .repository
            .embedded_tracks(fetch_limit, criteria.avoid_explicit)
            .await?;

        let mut candidates: Vec<SearchCandidate> = tracks
            .into_iter()
            .map(|t| SearchCandidate {
                similarity: cosine_similarity(&query_embedding, &t.embedding),
                track_id: t.id,
                release_year: t.release_year,
            })
            .collect();
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        let (mut passing, threshold) = apply_adaptive_threshold(candidates, limit);
        info!(
            "Vector search kept {} candidates at threshold {}",
            passing.len(),
            threshold
        );

        tiered_shuffle(&mut passing, rng);
        passing.truncate(limit);
        Ok(passing)
    }
}

/// Natural-language description of the criteria, fed to the embedding model.
pub fn build_search_description(criteria: &SongSelectionCriteria) -> String {
    let mut parts = vec![criteria.query_text.trim().to_string()];

    if !criteria.genre_names.is_empty() {
        parts.push(format!("genres: {}", criteria.genre_names.join(", ")));
    }

    if !criteria.mood_weights.is_empty() {
        let mut moods: Vec<(&String, &f32)> = criteria.mood_weights.iter().collect();
        moods.sort_by(|a, b| b.1.total_cmp(a.1));
        let labels: Vec<&str> = moods.iter().take(5).map(|(l, _)| l.as_str()).collect();
        parts.push(format!("mood: {}", labels.join(", ")));
    }

    if let Some(range) = criteria.energy_range {
        let tempo_hint = if range.min >= 70.0 {
            "fast energetic tempo"
        } else if range.max <= 35.0 {
            "slow gentle tempo"
        } else {
            "moderate tempo"
        };
        parts.push(tempo_hint.to_string());
    }

    if let Some(range) = criteria.year_ranges.first() {
        parts.push(format!("from {} to {}", range.start, range.end));
    }

    parts.retain(|p| !p.is_empty());
    parts.join(". ")
}

/// Cosine similarity; any zero vector yields 0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Threshold cascade: 0.75, then 0.6 if too few candidates pass, then 0.45.
/// Returns the surviving candidates (still sorted) and the threshold used.
pub fn apply_adaptive_threshold(
    sorted: Vec<SearchCandidate>,
    limit: usize,
) -> (Vec<SearchCandidate>, f32) {
    let first_need = 5.max(limit / 5);
    let second_need = 10.max(limit * 2 / 5);

    let count_at = |t: f32| sorted.iter().filter(|c| c.similarity >= t).count();

    let mut threshold = 0.75;
    if count_at(threshold) < first_need {
        threshold = 0.6;
        if count_at(threshold) < second_need {
            threshold = 0.45;
        }
    }

    let passing = sorted
        .into_iter()
        .filter(|c| c.similarity >= threshold)
        .collect();
    (passing, threshold)
}

/// Keep the top 30% in order, shuffle the middle 40% and bottom 30%
/// independently.
pub fn tiered_shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    tiered_shuffle_scaled(items, 1.0, rng);
}

/// Tiered shuffle at reduced magnitude: a factor of 1.0 fully shuffles the
/// lower segments, smaller factors perform proportionally fewer swaps.
pub fn tiered_shuffle_scaled<T, R: Rng>(items: &mut [T], factor: f32, rng: &mut R) {
    let n = items.len();
    if n < 4 || factor <= 0.0 {
        return;
    }

    let top_end = n * 3 / 10;
    let mid_end = n * 7 / 10;

    let mut shuffle_segment = |start: usize, end: usize| {
        let segment = &mut items[start..end];
        if segment.len() < 2 {
            return;
        }
        if factor >= 1.0 {
            segment.shuffle(rng);
        } else {
            let swaps = ((segment.len() as f32) * factor).round() as usize;
            for _ in 0..swaps {
                let i = rng.gen_range(0..segment.len());
                let j = rng.gen_range(0..segment.len());
                segment.swap(i, j);
            }
        }
    };

    shuffle_segment(top_end, mid_end);
    shuffle_segment(mid_end, n);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repository::mock::{MockCatalog, MockTrack};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedding {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedEmbedding {
        fn new(vector: Vec<f32>) -> Self {
            Self { vector, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedding {
        async fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
            Err(AppError::ExternalApi("embedding provider down".into()))
        }
    }

    fn candidate(similarity: f32) -> SearchCandidate {
        SearchCandidate {
            track_id: uuid::Uuid::new_v4(),
            similarity,
            release_year: None,
        }
    }

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let v = vec![0.3, -0.7, 0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let v = vec![0.5, 0.5];
        let zero = vec![0.0, 0.0];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn threshold_stays_high_with_enough_candidates() {
        let sorted: Vec<_> = (0..8).map(|_| candidate(0.8)).collect();
        let (passing, threshold) = apply_adaptive_threshold(sorted, 10);
        assert_eq!(threshold, 0.75);
        assert_eq!(passing.len(), 8);
    }

    #[test]
    fn threshold_cascades_down_when_sparse() {
        let mut sims = vec![0.9, 0.8];
        sims.extend(vec![0.65; 4]);
        sims.extend(vec![0.5; 4]);
        let sorted: Vec<_> = sims.into_iter().map(candidate).collect();

        // 2 pass at 0.75 (< 5), 6 pass at 0.6 (< 10), so the floor is used
        let (passing, threshold) = apply_adaptive_threshold(sorted, 10);
        assert_eq!(threshold, 0.45);
        assert_eq!(passing.len(), 10);
    }

    #[test]
    fn threshold_never_drops_below_floor() {
        let sorted = vec![candidate(0.3), candidate(0.2)];
        let (passing, threshold) = apply_adaptive_threshold(sorted, 10);
        assert_eq!(threshold, 0.45);
        assert!(passing.is_empty());
    }

    #[test]
    fn tiered_shuffle_preserves_top_segment() {
        let mut items: Vec<usize> = (0..10).collect();
        let mut rng = StdRng::seed_from_u64(7);
        tiered_shuffle(&mut items, &mut rng);
        // Top 30% of 10 = first 3 stay in order
        assert_eq!(&items[..3], &[0, 1, 2]);
        // Same multiset afterwards
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn tiered_shuffle_is_deterministic_with_seeded_rng() {
        let mut a: Vec<usize> = (0..20).collect();
        let mut b: Vec<usize> = (0..20).collect();
        tiered_shuffle(&mut a, &mut StdRng::seed_from_u64(42));
        tiered_shuffle(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_factor_leaves_order_untouched() {
        let mut items: Vec<usize> = (0..10).collect();
        tiered_shuffle_scaled(&mut items, 0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    fn embedded_catalog() -> Arc<MockCatalog> {
        // Query embedding will be [1, 0]; similarity equals the first component
        let tracks = vec![
            MockTrack::new("a", "A").with_embedding(vec![1.0, 0.0]),
            MockTrack::new("b", "B").with_embedding(vec![0.9, 0.436]),
            MockTrack::new("c", "C").with_embedding(vec![0.8, 0.6]),
            MockTrack::new("d", "D").with_embedding(vec![0.78, 0.626]),
            MockTrack::new("e", "E").with_embedding(vec![0.76, 0.65]),
            MockTrack::new("f", "F").with_embedding(vec![0.3, 0.954]),
        ];
        Arc::new(MockCatalog::with_tracks(tracks))
    }

    #[tokio::test]
    async fn search_respects_limit_and_threshold() {
        let engine = VectorSearchEngine::new(
            Arc::new(FixedEmbedding::new(vec![1.0, 0.0])),
            embedded_catalog(),
        );
        let criteria = SongSelectionCriteria::new("upbeat summer driving songs");

        let mut rng = StdRng::seed_from_u64(3);
        let results = engine.search_with_rng(&criteria, 3, &mut rng).await.unwrap();

        assert!(results.len() <= 3);
        // 5 tracks pass at 0.75 (>= max(5, 0)), so that threshold sticks
        for c in &results {
            assert!(c.similarity >= 0.75, "similarity {} below threshold", c.similarity);
        }
    }

    #[tokio::test]
    async fn short_description_skips_embedding_entirely() {
        let provider = Arc::new(FixedEmbedding::new(vec![1.0, 0.0]));
        let engine = VectorSearchEngine::new(provider.clone(), embedded_catalog());
        let criteria = SongSelectionCriteria::new("hi");

        let results = engine.search(&criteria, 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn embedding_failure_returns_empty_not_error() {
        let engine = VectorSearchEngine::new(Arc::new(FailingEmbedding), embedded_catalog());
        let criteria = SongSelectionCriteria::new("long enough description here");

        let results = engine.search(&criteria, 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn description_includes_genres_moods_and_era() {
        let mut criteria = SongSelectionCriteria::new("something for the gym");
        criteria.genre_names = vec!["rock".to_string()];
        criteria.mood_weights.insert("energetic".to_string(), 0.9);
        criteria.year_ranges = vec![crate::models::YearRange { start: 1990, end: 1999 }];

        let description = build_search_description(&criteria);
        assert!(description.contains("rock"));
        assert!(description.contains("energetic"));
        assert!(description.contains("1990"));
    }
}
