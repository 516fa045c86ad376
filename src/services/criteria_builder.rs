//! Criteria Builder
//!
//! Turns a merged prompt analysis into resolved selection criteria: names
//! become storage ids, decades and emoji eras become year ranges, mood
//! signals collapse into a weight map, and the diversity dial becomes an
//! artist-repetition cap.

use crate::error::Result;
use crate::models::{
    EnergyRange, PromptAnalysisResult, Signal, SongSelectionCriteria, YearRange,
};
use crate::repository::MusicRepository;
use crate::services::prompt_analyzer::vector_similarity_weight;
use chrono::Datelike;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const NEUTRAL_LEVEL: f32 = 50.0;
const ENERGY_WINDOW: f32 = 25.0;

pub struct CriteriaBuilder {
    repository: Arc<dyn MusicRepository>,
}

impl CriteriaBuilder {
    pub fn new(repository: Arc<dyn MusicRepository>) -> Self {
        Self { repository }
    }

    pub async fn build(
        &self,
        prompt: &str,
        analysis: &PromptAnalysisResult,
        avoid_explicit_override: Option<bool>,
    ) -> Result<SongSelectionCriteria> {
        // Independent name resolutions, issued together
        let (artist_ids, genre_ids) = tokio::join!(
            self.repository
                .find_artist_ids_by_name(&analysis.explicit_artists),
            self.repository
                .find_genre_ids_by_name(&analysis.explicit_genres),
        );

        let mut criteria = SongSelectionCriteria::new(prompt);
        criteria.explicit_artist_ids = artist_ids?;
        criteria.explicit_genre_ids = genre_ids?;
        criteria.genre_names = analysis.explicit_genres.clone();
        if criteria.genre_names.is_empty() {
            criteria.genre_names = analysis
                .emoji_genres
                .iter()
                .map(|g| g.label.clone())
                .collect();
        }

        criteria.year_ranges =
            build_year_ranges(&analysis.explicit_decades, analysis.emoji_era.as_deref());
        criteria.mood_weights = merge_mood_weights(&analysis.emoji_moods, &analysis.implied_moods);

        if (analysis.energy_level - NEUTRAL_LEVEL).abs() > f32::EPSILON {
            criteria.energy_range = Some(EnergyRange {
                min: (analysis.energy_level - ENERGY_WINDOW).clamp(0.0, 100.0),
                max: (analysis.energy_level + ENERGY_WINDOW).clamp(0.0, 100.0),
            });
        }

        let has_symbolic_criteria = analysis.has_explicit_signals() || analysis.has_emoji_signals();
        criteria.max_artist_repetition =
            artist_repetition_cap(analysis.diversity_preference, has_symbolic_criteria);
        criteria.vector_similarity_weight = vector_similarity_weight(analysis);
        criteria.avoid_explicit = avoid_explicit_override.unwrap_or(analysis.avoid_explicit);

        if analysis.diversity_preference > 60.0 {
            criteria.diversity_factor = Some(analysis.diversity_preference / 100.0);
        }

        let occasion = analysis
            .emoji_occasion
            .clone()
            .or_else(|| top_occasion(&analysis.implied_occasions));
        if let Some(occasion) = occasion {
            debug!("Applying occasion overrides for '{}'", occasion);
            apply_occasion_overrides(&mut criteria, &occasion);
        }

        // Keep the downstream filter's energy bounds in the track feature
        // scale (0.0-1.0)
        if let Some(range) = criteria.energy_range {
            criteria.feature_bounds.energy =
                Some(((range.min / 100.0) as f64, (range.max / 100.0) as f64));
        }

        Ok(criteria)
    }
}

/// Explicit decades plus the emoji-era table produce inclusive year ranges.
pub fn build_year_ranges(decades: &[i32], emoji_era: Option<&str>) -> Vec<YearRange> {
    let mut ranges: Vec<YearRange> = decades
        .iter()
        .map(|&d| YearRange { start: d, end: d + 9 })
        .collect();

    if ranges.is_empty() {
        if let Some(era) = emoji_era {
            let current_year = chrono::Utc::now().year();
            let range = match era {
                "retro" => Some(YearRange { start: 1980, end: 1999 }),
                "classic" => Some(YearRange { start: 1960, end: 1979 }),
                "classical" => Some(YearRange { start: 1900, end: 1959 }),
                "modern" => Some(YearRange { start: 2010, end: current_year }),
                _ => None,
            };
            ranges.extend(range);
        }
    }

    ranges
}

/// Per label, the maximum confidence across sources; emoji wins ties because
/// it is inserted first.
pub fn merge_mood_weights(emoji: &[Signal], implied: &[Signal]) -> HashMap<String, f32> {
    let mut weights: HashMap<String, f32> = HashMap::new();
    for signal in emoji.iter().chain(implied) {
        let entry = weights.entry(signal.label.clone()).or_insert(0.0);
        if signal.confidence > *entry {
            *entry = signal.confidence;
        }
    }
    weights
}

pub fn artist_repetition_cap(diversity_preference: f32, has_symbolic_criteria: bool) -> usize {
    if diversity_preference > 70.0 {
        1
    } else if diversity_preference < 30.0 {
        4
    } else if has_symbolic_criteria {
        2
    } else {
        3
    }
}

/// Occasions carry strong conventions about energy and mood regardless of
/// what the rest of the prompt said.
fn apply_occasion_overrides(criteria: &mut SongSelectionCriteria, occasion: &str) {
    let mut boost = |label: &str, confidence: f32| {
        let entry = criteria.mood_weights.entry(label.to_string()).or_insert(0.0);
        if confidence > *entry {
            *entry = confidence;
        }
    };

    match occasion {
        "workout" => {
            boost("energetic", 0.9);
            boost("motivational", 0.8);
            raise_min_energy(criteria, 70.0);
        }
        "party" => {
            boost("danceable", 0.9);
            boost("upbeat", 0.8);
            raise_min_energy(criteria, 65.0);
            criteria.feature_bounds.danceability = Some((0.6, 1.0));
        }
        "study" | "focus" => {
            boost("calm", 0.8);
            boost("focused", 0.7);
            lower_max_energy(criteria, 60.0);
        }
        "sleep" | "meditation" => {
            boost("peaceful", 0.9);
            boost("calm", 0.85);
            lower_max_energy(criteria, 30.0);
        }
        "romantic" => {
            boost("romantic", 0.9);
            boost("smooth", 0.7);
        }
        _ => {}
    }
}

fn raise_min_energy(criteria: &mut SongSelectionCriteria, floor: f32) {
    let range = criteria
        .energy_range
        .get_or_insert(EnergyRange { min: floor, max: 100.0 });
    if range.min < floor {
        range.min = floor;
    }
    if range.max < range.min {
        range.max = 100.0;
    }
}

fn lower_max_energy(criteria: &mut SongSelectionCriteria, ceiling: f32) {
    let range = criteria
        .energy_range
        .get_or_insert(EnergyRange { min: 0.0, max: ceiling });
    if range.max > ceiling {
        range.max = ceiling;
    }
    if range.min > range.max {
        range.min = 0.0;
    }
}

fn top_occasion(occasions: &[Signal]) -> Option<String> {
    occasions
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .map(|s| s.label.clone())
}
