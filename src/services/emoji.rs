//! Emoji Analyzer
//!
//! Pure lookup-table classifier mapping emoji characters to mood, genre, era
//! and occasion signals, plus derived energy/danceability/diversity scores.
//! No I/O, no model calls; a prompt without emoji produces neutral defaults.

use crate::models::{EmojiAnalysisResult, Signal};
use lazy_static::lazy_static;
use std::collections::HashMap;

const NEUTRAL_LEVEL: f32 = 50.0;

// Entries are folded into maps in order, so when an emoji appears twice the
// later entry overwrites the earlier one. That is the only precedence rule.
const MOOD_ENTRIES: &[(char, &str, f32)] = &[
    ('🔥', "energetic", 0.9),
    ('⚡', "energetic", 0.85),
    ('😊', "happy", 0.85),
    ('😄', "happy", 0.85),
    ('🥰', "romantic", 0.85),
    ('😢', "melancholic", 0.9),
    ('😭', "sad", 0.9),
    ('🌧', "melancholic", 0.7),
    ('😌', "calm", 0.8),
    ('🕊', "peaceful", 0.75),
    ('😡', "aggressive", 0.85),
    ('😤', "intense", 0.8),
    ('🤩', "euphoric", 0.8),
    ('😎', "confident", 0.75),
    ('☀', "upbeat", 0.75),
    ('💪', "motivational", 0.85),
    ('🖤', "dark", 0.8),
    ('✨', "dreamy", 0.7),
    ('🥺', "wistful", 0.7),
];

const GENRE_ENTRIES: &[(char, &str, f32)] = &[
    ('🤘', "rock", 0.7),
    ('🎸', "rock", 0.85),
    ('🤘', "metal", 0.9),
    ('🎻', "classical", 0.85),
    ('🎹', "jazz", 0.7),
    ('🎷', "jazz", 0.9),
    ('🎺', "jazz", 0.75),
    ('🤠', "country", 0.85),
    ('🪕', "folk", 0.8),
    ('🪗', "folk", 0.75),
    ('🎧', "electronic", 0.8),
    ('🔊', "electronic", 0.7),
    ('🕺', "disco", 0.85),
    ('💃', "latin", 0.8),
    ('🎤', "pop", 0.7),
];

const ERA_ENTRIES: &[(char, &str)] = &[
    ('📻', "retro"),
    ('📼', "retro"),
    ('💾', "retro"),
    ('🕰', "classic"),
    ('🎞', "classic"),
    ('🏛', "classical"),
    ('🚀', "modern"),
    ('📱', "modern"),
];

const OCCASION_ENTRIES: &[(char, &str)] = &[
    ('💪', "workout"),
    ('🏋', "workout"),
    ('🏃', "workout"),
    ('🎉', "party"),
    ('🥳', "party"),
    ('🪩', "party"),
    ('📚', "study"),
    ('✏', "study"),
    ('💻', "study"),
    ('😴', "sleep"),
    ('🌙', "sleep"),
    ('🧘', "meditation"),
    ('❤', "romantic"),
    ('💕', "romantic"),
    ('🌹', "romantic"),
];

const ENERGY_ENTRIES: &[(char, f32)] = &[
    ('🔥', 90.0),
    ('⚡', 90.0),
    ('💪', 85.0),
    ('🏋', 90.0),
    ('🏃', 85.0),
    ('🎉', 85.0),
    ('🥳', 85.0),
    ('🪩', 80.0),
    ('🤘', 85.0),
    ('😡', 85.0),
    ('🕺', 80.0),
    ('💃', 80.0),
    ('☀', 70.0),
    ('🎧', 60.0),
    ('✨', 55.0),
    ('❤', 45.0),
    ('😌', 30.0),
    ('😢', 25.0),
    ('😭', 20.0),
    ('🌙', 20.0),
    ('😴', 15.0),
    ('🧘', 15.0),
];

const DANCE_ENTRIES: &[(char, f32)] = &[
    ('🕺', 90.0),
    ('💃', 90.0),
    ('🪩', 85.0),
    ('🎉', 80.0),
    ('🥳', 80.0),
    ('🔥', 70.0),
    ('🎧', 65.0),
    ('🎷', 50.0),
    ('🎻', 20.0),
    ('😢', 20.0),
    ('😴', 10.0),
    ('🧘', 10.0),
];

/// Globe/rainbow symbols that read as a request for variety.
const DIVERSITY_EMOJIS: &[char] = &['🌍', '🌎', '🌏', '🌐', '🗺', '🌈'];

lazy_static! {
    static ref MOOD_TABLE: HashMap<char, (&'static str, f32)> = MOOD_ENTRIES
        .iter()
        .map(|&(c, label, conf)| (c, (label, conf)))
        .collect();
    static ref GENRE_TABLE: HashMap<char, (&'static str, f32)> = GENRE_ENTRIES
        .iter()
        .map(|&(c, label, conf)| (c, (label, conf)))
        .collect();
    static ref ERA_TABLE: HashMap<char, &'static str> = ERA_ENTRIES.iter().copied().collect();
    static ref OCCASION_TABLE: HashMap<char, &'static str> =
        OCCASION_ENTRIES.iter().copied().collect();
    static ref ENERGY_TABLE: HashMap<char, f32> = ENERGY_ENTRIES.iter().copied().collect();
    static ref DANCE_TABLE: HashMap<char, f32> = DANCE_ENTRIES.iter().copied().collect();
}

pub struct EmojiAnalyzer;

impl EmojiAnalyzer {
    /// Classify every emoji in the text. Never errors; text without emoji
    /// yields `has_emojis = false` and neutral values.
    pub fn analyze(text: &str) -> EmojiAnalysisResult {
        let emojis: Vec<char> = text.chars().filter(|c| is_emoji(*c)).collect();

        if emojis.is_empty() {
            return EmojiAnalysisResult::default();
        }

        let mut moods: Vec<Signal> = Vec::new();
        let mut genres: Vec<Signal> = Vec::new();
        let mut era = None;
        let mut occasion = None;
        let mut energy_values = Vec::new();
        let mut dance_values = Vec::new();
        let mut genre_emoji = std::collections::HashSet::new();
        let mut has_diversity_emoji = false;

        for &emoji in &emojis {
            if let Some(&(label, confidence)) = MOOD_TABLE.get(&emoji) {
                push_signal(&mut moods, Signal::from_emoji(label, confidence, emoji));
            }
            if let Some(&(label, confidence)) = GENRE_TABLE.get(&emoji) {
                push_signal(&mut genres, Signal::from_emoji(label, confidence, emoji));
                genre_emoji.insert(emoji);
            }
            // First match in prompt order wins for era and occasion
            if era.is_none() {
                era = ERA_TABLE.get(&emoji).map(|e| e.to_string());
            }
            if occasion.is_none() {
                occasion = OCCASION_TABLE.get(&emoji).map(|o| o.to_string());
            }
            if let Some(&value) = ENERGY_TABLE.get(&emoji) {
                energy_values.push(value);
            }
            if let Some(&value) = DANCE_TABLE.get(&emoji) {
                dance_values.push(value);
            }
            if DIVERSITY_EMOJIS.contains(&emoji) {
                has_diversity_emoji = true;
            }
        }

        let mut diversity_boost = match genre_emoji.len() {
            n if n >= 3 => 20.0,
            2 => 10.0,
            _ => 0.0,
        };
        if has_diversity_emoji {
            diversity_boost += 15.0;
        }

        EmojiAnalysisResult {
            has_emojis: true,
            moods,
            genres,
            era,
            occasion,
            energy: mean_or_neutral(&energy_values),
            danceability: mean_or_neutral(&dance_values),
            diversity_boost,
        }
    }
}

/// Accumulate a signal, keeping the highest confidence per label.
fn push_signal(signals: &mut Vec<Signal>, signal: Signal) {
    match signals.iter_mut().find(|s| s.label == signal.label) {
        Some(existing) if existing.confidence < signal.confidence => *existing = signal,
        Some(_) => {}
        None => signals.push(signal),
    }
}

fn mean_or_neutral(values: &[f32]) -> f32 {
    if values.is_empty() {
        NEUTRAL_LEVEL
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Unicode-range emoji check. Variation selectors and ZWJ are ignored, which
/// means compound emoji degrade to their base character.
fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1F5FF   // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA00..=0x1FAFF // extended-A
        | 0x2600..=0x26FF   // misc symbols
        | 0x2700..=0x27BF   // dingbats
        | 0x2B00..=0x2BFF   // arrows & stars
        | 0x1F1E6..=0x1F1FF // regional indicators
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_emoji_returns_neutral_defaults() {
        let result = EmojiAnalyzer::analyze("some chill music for the evening");
        assert!(!result.has_emojis);
        assert_eq!(result.energy, 50.0);
        assert_eq!(result.danceability, 50.0);
        assert!(result.moods.is_empty());
        assert!(result.genres.is_empty());
        assert_eq!(result.diversity_boost, 0.0);
    }

    #[test]
    fn mood_emoji_produces_signal_with_source() {
        let result = EmojiAnalyzer::analyze("feeling it 🔥");
        assert!(result.has_emojis);
        let mood = result.moods.iter().find(|m| m.label == "energetic").unwrap();
        assert!(mood.confidence >= 0.9);
        assert_eq!(mood.source_char, Some('🔥'));
    }

    #[test]
    fn fire_and_flex_detect_workout() {
        let result = EmojiAnalyzer::analyze("🔥💪 lets go");
        assert_eq!(result.occasion.as_deref(), Some("workout"));
        assert!(result.energy >= 70.0);
        assert!(result.moods.iter().any(|m| m.label == "motivational"));
    }

    #[test]
    fn first_occasion_in_prompt_order_wins() {
        let result = EmojiAnalyzer::analyze("🎉 then 😴");
        assert_eq!(result.occasion.as_deref(), Some("party"));
    }

    #[test]
    fn energy_is_mean_of_matched_emoji() {
        // 🔥 = 90, 😴 = 15
        let result = EmojiAnalyzer::analyze("🔥😴");
        assert!((result.energy - 52.5).abs() < 0.01);
    }

    #[test]
    fn later_table_entry_overwrites_horns_to_metal() {
        let result = EmojiAnalyzer::analyze("🤘");
        let genre = result.genres.first().unwrap();
        assert_eq!(genre.label, "metal");
    }

    #[test]
    fn three_genre_emoji_boost_diversity() {
        let result = EmojiAnalyzer::analyze("🎸🎷🎧");
        assert_eq!(result.diversity_boost, 20.0);
    }

    #[test]
    fn two_genre_emoji_boost_less() {
        let result = EmojiAnalyzer::analyze("🎸🎷");
        assert_eq!(result.diversity_boost, 10.0);
    }

    #[test]
    fn globe_adds_diversity_on_top_of_genres() {
        let result = EmojiAnalyzer::analyze("🎸🎷🎧🌍");
        assert_eq!(result.diversity_boost, 35.0);
    }

    #[test]
    fn retro_radio_sets_era() {
        let result = EmojiAnalyzer::analyze("📻 tunes");
        assert_eq!(result.era.as_deref(), Some("retro"));
    }

    #[test]
    fn duplicate_mood_labels_keep_highest_confidence() {
        // 🔥 (0.9) and ⚡ (0.85) both map to energetic
        let result = EmojiAnalyzer::analyze("🔥⚡");
        let energetic: Vec<_> = result
            .moods
            .iter()
            .filter(|m| m.label == "energetic")
            .collect();
        assert_eq!(energetic.len(), 1);
        assert!((energetic[0].confidence - 0.9).abs() < f32::EPSILON);
    }
}
