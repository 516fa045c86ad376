//! Prompt Analyzer
//!
//! Orchestrates the three signal tiers under a strict priority policy:
//! explicit text mentions always win, emoji signals fill whatever dimensions
//! explicit extraction left empty, and the deep semantic analyzer only runs
//! when both of the tiers above found nothing for the genre dimension.
//!
//! The merge itself is a pure ordered-override function over the tier
//! outputs, kept separate from the orchestration so it can be tested without
//! a repository or model.

use crate::error::Result;
use crate::models::{EmojiAnalysisResult, PromptAnalysisResult, SemanticAnalysisResult};
use crate::repository::MusicRepository;
use crate::services::emoji::EmojiAnalyzer;
use crate::services::explicit::{ExplicitSignalExtractor, ExplicitSignals};
use crate::services::semantic::DeepSemanticAnalyzer;
use std::sync::Arc;
use tracing::debug;

const NEUTRAL_LEVEL: f32 = 50.0;

pub struct PromptAnalyzer {
    repository: Arc<dyn MusicRepository>,
    semantic: DeepSemanticAnalyzer,
}

impl PromptAnalyzer {
    pub fn new(repository: Arc<dyn MusicRepository>, semantic: DeepSemanticAnalyzer) -> Self {
        Self { repository, semantic }
    }

    pub async fn analyze(&self, prompt: &str) -> Result<PromptAnalysisResult> {
        // Explicit extraction and emoji analysis have no data dependency
        let (explicit, emoji) = tokio::join!(
            async {
                let known_artists = self.repository.artist_names().await?;
                Ok::<_, crate::error::AppError>(ExplicitSignalExtractor::extract(
                    prompt,
                    &known_artists,
                ))
            },
            async { EmojiAnalyzer::analyze(prompt) }
        );
        let explicit = explicit?;

        let genre_dimension_empty = explicit.artists.is_empty()
            && explicit.genres.is_empty()
            && explicit.decades.is_empty()
            && emoji.genres.is_empty();

        let implied = if genre_dimension_empty {
            debug!("No explicit or emoji genre signals, running deep semantic analysis");
            Some(self.semantic.analyze(prompt).await)
        } else {
            None
        };

        Ok(merge_tiers(explicit, emoji, implied))
    }
}

/// Ordered merge of the three signal tiers into the unified analysis result.
/// Implied-tier contributions are only adopted for dimensions the emoji tier
/// left empty.
pub fn merge_tiers(
    explicit: ExplicitSignals,
    emoji: EmojiAnalysisResult,
    implied: Option<SemanticAnalysisResult>,
) -> PromptAnalysisResult {
    let mut result = PromptAnalysisResult {
        explicit_artists: explicit.artists,
        explicit_genres: explicit.genres,
        explicit_decades: explicit.decades,
        emoji_moods: emoji.moods,
        emoji_genres: emoji.genres,
        emoji_era: emoji.era,
        emoji_occasion: emoji.occasion.clone(),
        avoid_explicit: explicit.avoid_explicit,
        has_emojis: emoji.has_emojis,
        ..PromptAnalysisResult::default()
    };

    if emoji.has_emojis {
        result.energy_level = emoji.energy;
        result.diversity_preference = (NEUTRAL_LEVEL + emoji.diversity_boost).clamp(0.0, 100.0);
    }

    if let Some(implied) = implied {
        if result.emoji_moods.is_empty() {
            result.implied_moods = implied.moods;
        }
        if emoji.occasion.is_none() {
            result.implied_occasions = implied.occasions;
        }
        if !emoji.has_emojis || emoji.energy == NEUTRAL_LEVEL {
            result.energy_level = implied.energy;
        }
        if !emoji.has_emojis || emoji.diversity_boost == 0.0 {
            result.diversity_preference = implied.diversity;
        }
        result.narrative_elements = implied.narrative_elements;
    }

    result
}

/// How much weight similarity-only ranking should carry downstream. Stepped
/// down as symbolic confidence increases: unambiguous text mentions dominate,
/// emoji-only evidence slightly less so.
pub fn vector_similarity_weight(analysis: &PromptAnalysisResult) -> f32 {
    if analysis.has_explicit_signals() {
        0.3
    } else if analysis.has_emoji_signals() {
        0.35
    } else {
        1.0
    }
}
