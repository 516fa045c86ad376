//! Deep Semantic Analyzer
//!
//! Last tier of prompt understanding: asks the chat model to infer moods,
//! occasions, energy, diversity and narrative elements when neither explicit
//! text mentions nor emoji gave us anything to work with.
//!
//! This path must never fail the pipeline. Provider errors and malformed
//! JSON both collapse to neutral defaults.

use crate::models::{SemanticAnalysisResult, Signal};
use crate::providers::{json::parse_model_json, ChatProvider};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RawSignal {
    label: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawSemanticResponse {
    #[serde(default)]
    moods: Vec<RawSignal>,
    #[serde(default)]
    occasions: Vec<RawSignal>,
    #[serde(default)]
    energy: Option<f32>,
    #[serde(default)]
    diversity: Option<f32>,
    #[serde(default)]
    narrative_elements: Vec<String>,
}

pub struct DeepSemanticAnalyzer {
    chat: Arc<dyn ChatProvider>,
}

impl DeepSemanticAnalyzer {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }

    pub async fn analyze(&self, prompt: &str) -> SemanticAnalysisResult {
        let instruction = format!(
            r#"You are a music request analyst. The user's playlist request contained no recognizable artist, genre, decade or emoji signals, so infer the intent from the language alone.

USER REQUEST: "{}"

Infer:
1. moods: up to 5 mood labels with confidence 0.0-1.0
2. occasions: up to 3 occasion labels (e.g. "workout", "party", "study", "sleep", "romantic") with confidence
3. energy: desired energy level 0-100
4. diversity: how much variety the user wants 0-100
5. narrative_elements: short phrases describing any story or imagery in the request

Respond with ONLY a JSON object:
{{
  "moods": [{{"label": "wistful", "confidence": 0.8}}],
  "occasions": [{{"label": "late night drive", "confidence": 0.7}}],
  "energy": 40,
  "diversity": 55,
  "narrative_elements": ["driving at night", "city lights"]
}}"#,
            prompt
        );

        let reply = match self.chat.complete(&instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Semantic analysis provider call failed, using neutral defaults: {}", e);
                return SemanticAnalysisResult::default();
            }
        };

        match parse_model_json::<RawSemanticResponse>(&reply) {
            Ok(raw) => {
                debug!(
                    "Semantic analysis inferred {} moods, {} occasions",
                    raw.moods.len(),
                    raw.occasions.len()
                );
                SemanticAnalysisResult {
                    moods: convert_signals(raw.moods),
                    occasions: convert_signals(raw.occasions),
                    energy: raw.energy.unwrap_or(50.0).clamp(0.0, 100.0),
                    diversity: raw.diversity.unwrap_or(50.0).clamp(0.0, 100.0),
                    narrative_elements: raw.narrative_elements,
                }
            }
            Err(e) => {
                warn!("Semantic analysis returned unusable JSON, using neutral defaults: {}", e);
                SemanticAnalysisResult::default()
            }
        }
    }
}

fn convert_signals(raw: Vec<RawSignal>) -> Vec<Signal> {
    raw.into_iter()
        .map(|s| Signal::new(s.label, s.confidence.clamp(0.0, 1.0)))
        .collect()
}
