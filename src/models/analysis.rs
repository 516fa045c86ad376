use serde::{Deserialize, Serialize};

/// A mood/genre/occasion label with a confidence and the character (if any)
/// it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub label: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_char: Option<char>,
}

impl Signal {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            source_char: None,
        }
    }

    pub fn from_emoji(label: impl Into<String>, confidence: f32, emoji: char) -> Self {
        Self {
            label: label.into(),
            confidence,
            source_char: Some(emoji),
        }
    }
}

/// Output of the pure emoji classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiAnalysisResult {
    pub has_emojis: bool,
    pub moods: Vec<Signal>,
    pub genres: Vec<Signal>,
    pub era: Option<String>,
    pub occasion: Option<String>,
    /// 0-100, mean of matched emoji energy hints; 50 when none matched.
    pub energy: f32,
    /// 0-100, mean of matched emoji danceability hints; 50 when none matched.
    pub danceability: f32,
    pub diversity_boost: f32,
}

impl Default for EmojiAnalysisResult {
    fn default() -> Self {
        Self {
            has_emojis: false,
            moods: Vec::new(),
            genres: Vec::new(),
            era: None,
            occasion: None,
            energy: 50.0,
            danceability: 50.0,
            diversity_boost: 0.0,
        }
    }
}

/// Output of the deep semantic (LLM) analyzer. Neutral defaults are returned
/// whenever the model call fails or its output cannot be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticAnalysisResult {
    pub moods: Vec<Signal>,
    pub occasions: Vec<Signal>,
    pub energy: f32,
    pub diversity: f32,
    pub narrative_elements: Vec<String>,
}

impl Default for SemanticAnalysisResult {
    fn default() -> Self {
        Self {
            moods: Vec::new(),
            occasions: Vec::new(),
            energy: 50.0,
            diversity: 50.0,
            narrative_elements: Vec::new(),
        }
    }
}

/// Unified result of prompt understanding, merged across the explicit, emoji
/// and implied tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptAnalysisResult {
    pub explicit_artists: Vec<String>,
    pub explicit_genres: Vec<String>,
    pub explicit_decades: Vec<i32>,
    pub emoji_moods: Vec<Signal>,
    pub emoji_genres: Vec<Signal>,
    pub emoji_era: Option<String>,
    pub emoji_occasion: Option<String>,
    pub implied_moods: Vec<Signal>,
    pub implied_occasions: Vec<Signal>,
    pub energy_level: f32,
    pub diversity_preference: f32,
    pub obscurity_preference: f32,
    pub narrative_elements: Vec<String>,
    pub avoid_explicit: bool,
    pub has_emojis: bool,
}

impl Default for PromptAnalysisResult {
    fn default() -> Self {
        Self {
            explicit_artists: Vec::new(),
            explicit_genres: Vec::new(),
            explicit_decades: Vec::new(),
            emoji_moods: Vec::new(),
            emoji_genres: Vec::new(),
            emoji_era: None,
            emoji_occasion: None,
            implied_moods: Vec::new(),
            implied_occasions: Vec::new(),
            energy_level: 50.0,
            diversity_preference: 50.0,
            obscurity_preference: 50.0,
            narrative_elements: Vec::new(),
            avoid_explicit: false,
            has_emojis: false,
        }
    }
}

impl PromptAnalysisResult {
    /// True when any unambiguous text mention (artist, genre or decade) was
    /// found. Symbolic evidence of this strength demotes similarity-only
    /// ranking downstream.
    pub fn has_explicit_signals(&self) -> bool {
        !self.explicit_artists.is_empty()
            || !self.explicit_genres.is_empty()
            || !self.explicit_decades.is_empty()
    }

    pub fn has_emoji_signals(&self) -> bool {
        !self.emoji_genres.is_empty() || self.emoji_era.is_some()
    }
}
