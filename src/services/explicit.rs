//! Explicit Signal Extractor
//!
//! Regex/dictionary detection of literal artist names, genre names and
//! decade/era mentions in prompt text. These are the strongest signals in the
//! tier hierarchy: whatever is found here overrides emoji and implied tiers.

use lazy_static::lazy_static;
use regex::Regex;

const MAX_ARTIST_MATCHES: usize = 5;
const MAX_GENRE_MATCHES: usize = 5;

const KNOWN_GENRES: &[&str] = &[
    "rock", "pop", "jazz", "classical", "hip-hop", "rap", "country", "folk", "metal",
    "electronic", "house", "techno", "disco", "funk", "soul", "r&b", "blues", "reggae",
    "punk", "indie", "k-pop", "latin", "ambient", "edm", "gospel", "grunge", "ska",
    "synthwave", "lo-fi", "afrobeat",
];

/// Alias -> canonical genre name.
const GENRE_ALIASES: &[(&str, &str)] = &[
    ("kpop", "k-pop"),
    ("k pop", "k-pop"),
    ("hiphop", "hip-hop"),
    ("hip hop", "hip-hop"),
    ("rnb", "r&b"),
    ("r and b", "r&b"),
    ("lofi", "lo-fi"),
    ("lo fi", "lo-fi"),
    ("electronica", "electronic"),
    ("dance music", "edm"),
];

/// Named-era phrase -> decade start year.
const NAMED_ERAS: &[(&str, i32)] = &[
    ("jazz age", 1920),
    ("swing era", 1930),
    ("big band era", 1940),
    ("golden oldies", 1950),
    ("motown era", 1960),
    ("disco era", 1970),
    ("new wave era", 1980),
    ("grunge era", 1990),
];

lazy_static! {
    // "80s", "80's", "1980s"
    static ref DECADE_SUFFIX: Regex = Regex::new(r"\b(\d{2}|\d{4})'?s\b").unwrap();
    // "1975-1983", "1975 to 1983"
    static ref YEAR_RANGE: Regex = Regex::new(
        r"\b(1[89]\d{2}|20\d{2})\s*(?:-|–|to|through)\s*(1[89]\d{2}|20\d{2})\b"
    )
    .unwrap();
    // bare 4-digit years; "1980s" is not matched because the trailing 's'
    // removes the word boundary
    static ref BARE_YEAR: Regex = Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").unwrap();
    static ref CLEAN_REQUEST: Regex = Regex::new(
        r"(?i)\b(clean|family[ -]friendly|sfw|no explicit|kid[ -]friendly|radio edit|no swearing|no cursing)\b"
    )
    .unwrap();
}

#[derive(Debug, Clone, Default)]
pub struct ExplicitSignals {
    pub artists: Vec<String>,
    pub genres: Vec<String>,
    pub decades: Vec<i32>,
    pub avoid_explicit: bool,
}

pub struct ExplicitSignalExtractor;

impl ExplicitSignalExtractor {
    pub fn extract(prompt: &str, known_artists: &[String]) -> ExplicitSignals {
        ExplicitSignals {
            artists: Self::extract_artists(prompt, known_artists),
            genres: Self::extract_genres(prompt),
            decades: Self::extract_decades(prompt),
            avoid_explicit: Self::detects_clean_request(prompt),
        }
    }

    /// Match known artist names against the prompt. Names are tested longest
    /// first so "Daft Punk" wins over a hypothetical artist named "Punk".
    pub fn extract_artists(prompt: &str, known_artists: &[String]) -> Vec<String> {
        let mut names: Vec<&String> = known_artists.iter().collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));

        let mut matched = Vec::new();
        for name in names {
            if matched.len() >= MAX_ARTIST_MATCHES {
                break;
            }
            if name.len() < 2 {
                continue;
            }
            // Word boundary plus optional possessive ("Prince's best songs")
            let pattern = format!(r"(?i)\b{}(?:'s)?\b", regex::escape(name));
            if let Ok(re) = Regex::new(&pattern) {
                if re.is_match(prompt) {
                    matched.push(name.clone());
                }
            }
        }
        matched
    }

    /// Dictionary genre detection with alias normalization and compound
    /// descriptors ("jazz-inspired", "disco influenced").
    pub fn extract_genres(prompt: &str) -> Vec<String> {
        let mut found = Vec::new();

        let mut check = |term: &str, canonical: &str| {
            if found.len() >= MAX_GENRE_MATCHES || found.iter().any(|g: &String| g == canonical) {
                return;
            }
            let pattern = format!(
                r"(?i)\b{}(?:[- ](?:inspired|influenced|style|based))?\b",
                regex::escape(term)
            );
            if let Ok(re) = Regex::new(&pattern) {
                if re.is_match(prompt) {
                    found.push(canonical.to_string());
                }
            }
        };

        for genre in KNOWN_GENRES {
            check(genre, genre);
        }
        for (alias, canonical) in GENRE_ALIASES {
            check(alias, canonical);
        }

        found
    }

    /// Decade extraction across four notations: decade suffixes ("80s",
    /// "1980s"), named eras ("disco era"), explicit year ranges
    /// ("1975-1983", expanded per decade bucket) and bare 4-digit years.
    pub fn extract_decades(prompt: &str) -> Vec<i32> {
        let lowered = prompt.to_lowercase();
        let mut decades = Vec::new();

        for caps in DECADE_SUFFIX.captures_iter(&lowered) {
            if let Ok(value) = caps[1].parse::<i32>() {
                let decade = match value {
                    0..=29 => 2000 + (value / 10) * 10,
                    30..=99 => 1900 + (value / 10) * 10,
                    1900..=2099 => (value / 10) * 10,
                    _ => continue,
                };
                decades.push(decade);
            }
        }

        for (phrase, decade) in NAMED_ERAS {
            if lowered.contains(phrase) {
                decades.push(*decade);
            }
        }

        for caps in YEAR_RANGE.captures_iter(&lowered) {
            let (start, end) = (caps[1].parse::<i32>(), caps[2].parse::<i32>());
            if let (Ok(start), Ok(end)) = (start, end) {
                if start <= end {
                    let mut decade = (start / 10) * 10;
                    while decade <= end {
                        decades.push(decade);
                        decade += 10;
                    }
                }
            }
        }

        for caps in BARE_YEAR.captures_iter(&lowered) {
            if let Ok(year) = caps[1].parse::<i32>() {
                decades.push((year / 10) * 10);
            }
        }

        decades.sort_unstable();
        decades.dedup();
        decades
    }

    /// Case-insensitive detection of "keep it clean" phrasing.
    pub fn detects_clean_request(prompt: &str) -> bool {
        CLEAN_REQUEST.is_match(prompt)
    }
}
