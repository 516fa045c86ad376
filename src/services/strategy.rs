//! Strategy Pipeline
//!
//! Direct-generation path: classify the raw request into one of five
//! retrieval strategies, execute the matching search with a multi-level
//! fallback chain, re-rank the pool down to the target size with one model
//! call, and finally name the playlist.
//!
//! Every model call has a deterministic fallback; the only error this
//! pipeline surfaces is "no tracks found", and only when storage itself has
//! zero rows.

use crate::error::{AppError, Result};
use crate::providers::{json::parse_model_json, ChatProvider};
use crate::repository::{CriteriaQuery, MusicRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Retrieval strategy chosen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Text,
    Genre,
    Artist,
    Criteria,
    Random,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Text => "text",
            Strategy::Genre => "genre",
            Strategy::Artist => "artist",
            Strategy::Criteria => "criteria",
            Strategy::Random => "random",
        }
    }
}

/// Progress updates emitted while a playlist is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum GenerationProgress {
    Classifying {
        prompt: String,
    },
    Searching {
        strategy: Strategy,
        message: String,
    },
    Ranking {
        pool_size: usize,
        target: usize,
    },
    Naming {
        message: String,
    },
    Completed {
        total_tracks: usize,
        strategy: Strategy,
    },
    /// Terminal event carrying the finished playlist, sent by the SSE
    /// endpoint after the pipeline returns.
    Done {
        track_ids: Vec<Uuid>,
        title: String,
        description: String,
        strategy: Strategy,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct GeneratedPlaylist {
    pub track_ids: Vec<Uuid>,
    pub title: String,
    pub description: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone)]
struct Classification {
    strategy: Strategy,
    query: String,
    genre: Option<String>,
    artist: Option<String>,
    criteria: CriteriaQuery,
}

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    strategy: String,
    #[serde(default)]
    params: ClassificationParams,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Default, Deserialize)]
struct ClassificationParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    year_range: Option<(i32, i32)>,
    #[serde(default)]
    energy_range: Option<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct RankingResponse {
    selected_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct NamingResponse {
    title: String,
    description: String,
}

pub struct StrategyPipeline {
    chat: Arc<dyn ChatProvider>,
    repository: Arc<dyn MusicRepository>,
}

impl StrategyPipeline {
    pub fn new(chat: Arc<dyn ChatProvider>, repository: Arc<dyn MusicRepository>) -> Self {
        Self { chat, repository }
    }

    pub async fn generate(&self, prompt: &str, target_size: usize) -> Result<GeneratedPlaylist> {
        let (tx, _rx) = mpsc::channel(10);
        self.generate_with_progress(prompt, target_size, tx).await
    }

    pub async fn generate_with_progress(
        &self,
        prompt: &str,
        target_size: usize,
        progress_tx: mpsc::Sender<GenerationProgress>,
    ) -> Result<GeneratedPlaylist> {
        let _ = progress_tx
            .send(GenerationProgress::Classifying { prompt: prompt.to_string() })
            .await;

        let classification = self.classify(prompt).await;
        info!("Classified request as {:?} strategy", classification.strategy);

        let _ = progress_tx
            .send(GenerationProgress::Searching {
                strategy: classification.strategy,
                message: format!("Searching with {:?} strategy", classification.strategy),
            })
            .await;

        let pool = self.search(&classification, target_size * 3).await?;

        if pool.is_empty() {
            let _ = progress_tx
                .send(GenerationProgress::Error {
                    message: "No tracks found".to_string(),
                })
                .await;
            return Err(AppError::NotFound("No tracks found".to_string()));
        }

        let _ = progress_tx
            .send(GenerationProgress::Ranking {
                pool_size: pool.len(),
                target: target_size,
            })
            .await;

        let track_ids = self.rank(prompt, pool, target_size).await?;

        let _ = progress_tx
            .send(GenerationProgress::Naming {
                message: "Generating title and description".to_string(),
            })
            .await;

        let (title, description) = self.name_playlist(prompt, &track_ids).await;

        let _ = progress_tx
            .send(GenerationProgress::Completed {
                total_tracks: track_ids.len(),
                strategy: classification.strategy,
            })
            .await;

        Ok(GeneratedPlaylist {
            track_ids,
            title,
            description,
            strategy: classification.strategy,
        })
    }

    /// One model call maps the prompt to a strategy. Anything malformed or
    /// unavailable collapses to the text strategy over the raw prompt.
    async fn classify(&self, prompt: &str) -> Classification {
        let fallback = Classification {
            strategy: Strategy::Text,
            query: prompt.to_string(),
            genre: None,
            artist: None,
            criteria: CriteriaQuery::default(),
        };

        let instruction = format!(
            r#"Classify this playlist request into a retrieval strategy.

REQUEST: "{}"

Strategies:
- "text": free-text search, use when the request names songs or vague themes. params.query
- "genre": a single dominant genre. params.genre
- "artist": a single dominant artist. params.artist
- "criteria": structured constraints (genres + years + energy). params.genres, params.year_range, params.energy_range
- "random": the user wants to be surprised

Respond with ONLY a JSON object:
{{
  "strategy": "text",
  "params": {{"query": "...", "genre": null, "artist": null, "genres": [], "year_range": null, "energy_range": null}},
  "reasoning": "Brief explanation"
}}"#,
            prompt
        );

        let reply = match self.chat.complete(&instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Strategy classification call failed, defaulting to text: {}", e);
                return fallback;
            }
        };

        let response: ClassificationResponse = match parse_model_json(&reply) {
            Ok(response) => response,
            Err(e) => {
                warn!("Strategy classification unparseable, defaulting to text: {}", e);
                return fallback;
            }
        };

        let strategy = match response.strategy.as_str() {
            "text" => Strategy::Text,
            "genre" => Strategy::Genre,
            "artist" => Strategy::Artist,
            "criteria" => Strategy::Criteria,
            "random" => Strategy::Random,
            other => {
                warn!("Unknown strategy '{}', defaulting to text", other);
                return fallback;
            }
        };

        debug!("Classification reasoning: {}", response.reasoning);

        Classification {
            strategy,
            query: response.params.query.unwrap_or_else(|| prompt.to_string()),
            genre: response.params.genre,
            artist: response.params.artist,
            criteria: CriteriaQuery {
                genres: response.params.genres,
                year_range: response.params.year_range,
                energy_range: response.params.energy_range,
            },
        }
    }

    /// Execute the classified strategy with its fallback chain. Only returns
    /// empty when the store has no rows at all.
    async fn search(&self, classification: &Classification, limit: usize) -> Result<Vec<Uuid>> {
        let mut pool = match classification.strategy {
            Strategy::Text => self.text_search_chain(&classification.query, limit).await,
            Strategy::Genre => {
                let genre = classification.genre.as_deref().unwrap_or(&classification.query);
                match self.repository.tracks_by_genre(genre, limit).await {
                    Ok(ids) if !ids.is_empty() => ids,
                    Ok(_) | Err(_) => {
                        warn!("Genre search empty or failed, sampling randomly");
                        self.random_or_any(limit).await
                    }
                }
            }
            Strategy::Artist => {
                let artist = classification.artist.as_deref().unwrap_or(&classification.query);
                match self.repository.tracks_by_artist(artist, limit).await {
                    Ok(ids) if !ids.is_empty() => ids,
                    Ok(_) | Err(_) => {
                        warn!("Artist search empty or failed, sampling randomly");
                        self.random_or_any(limit).await
                    }
                }
            }
            Strategy::Criteria => {
                match self
                    .repository
                    .tracks_by_criteria(&classification.criteria, limit)
                    .await
                {
                    Ok(ids) if !ids.is_empty() => ids,
                    Ok(_) | Err(_) => {
                        warn!("Criteria search empty or failed, sampling randomly");
                        self.random_or_any(limit).await
                    }
                }
            }
            Strategy::Random => self.random_or_any(limit).await,
        };

        // Fallback chains can overlap sources
        pool = dedup_preserving_order(pool);
        Ok(pool)
    }

    async fn text_search_chain(&self, query: &str, limit: usize) -> Vec<Uuid> {
        match self.repository.search_tracks_text(query, limit).await {
            Ok(ids) if !ids.is_empty() => return ids,
            Ok(_) => debug!("Text search found nothing, trying substring match"),
            Err(e) => warn!("Text search failed, trying substring match: {}", e),
        }

        match self.repository.search_tracks_substring(query, limit).await {
            Ok(ids) if !ids.is_empty() => return ids,
            Ok(_) => debug!("Substring search found nothing, sampling any rows"),
            Err(e) => warn!("Substring search failed, sampling any rows: {}", e),
        }

        self.repository.any_tracks(limit).await.unwrap_or_default()
    }

    async fn random_or_any(&self, limit: usize) -> Vec<Uuid> {
        match self.repository.random_tracks(limit).await {
            Ok(ids) if !ids.is_empty() => ids,
            Ok(_) | Err(_) => {
                warn!("Random sampling failed, taking any rows");
                self.repository.any_tracks(limit).await.unwrap_or_default()
            }
        }
    }

    /// One model call selects exactly `target` ids from the pool. A pool
    /// already at or under the target is returned verbatim; any mismatch in
    /// the reply falls back to the first N candidates in pool order.
    pub(crate) async fn rank(
        &self,
        prompt: &str,
        pool: Vec<Uuid>,
        target: usize,
    ) -> Result<Vec<Uuid>> {
        if pool.len() <= target {
            return Ok(pool);
        }

        let summaries = self.repository.track_summaries(&pool).await?;
        let listing: Vec<String> = summaries
            .iter()
            .map(|t| {
                format!(
                    "{}: \"{}\" by {} ({})",
                    t.id,
                    t.title,
                    t.artist,
                    t.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into())
                )
            })
            .collect();

        let instruction = format!(
            r#"You are selecting the best {} tracks for a playlist.

USER REQUEST: "{}"

CANDIDATE TRACKS:
{}

Select EXACTLY {} tracks that best match the request, with good variety and flow.
Only return IDs from the list above.

Respond with ONLY a JSON object:
{{
  "selected_ids": ["id1", "id2", ...]
}}"#,
            target,
            prompt,
            listing.join("\n"),
            target
        );

        let fallback: Vec<Uuid> = pool.iter().take(target).copied().collect();

        let reply = match self.chat.complete(&instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Ranking call failed, keeping first {} candidates: {}", target, e);
                return Ok(fallback);
            }
        };

        match parse_model_json::<RankingResponse>(&reply) {
            Ok(response) => {
                let valid: Vec<Uuid> = dedup_preserving_order(response.selected_ids)
                    .into_iter()
                    .filter(|id| pool.contains(id))
                    .collect();
                if valid.len() == target {
                    Ok(valid)
                } else {
                    warn!(
                        "Ranking returned {} usable ids instead of {}, keeping first candidates",
                        valid.len(),
                        target
                    );
                    Ok(fallback)
                }
            }
            Err(e) => {
                warn!("Ranking reply unparseable, keeping first {} candidates: {}", target, e);
                Ok(fallback)
            }
        }
    }

    /// Title/description generation; failures produce empty strings, never
    /// errors.
    pub(crate) async fn name_playlist(&self, prompt: &str, track_ids: &[Uuid]) -> (String, String) {
        let summaries = match self.repository.track_summaries(track_ids).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!("Could not load tracks for naming: {}", e);
                return (String::new(), String::new());
            }
        };

        let sample: Vec<String> = summaries
            .iter()
            .take(20)
            .map(|t| format!("\"{}\" by {}", t.title, t.artist))
            .collect();

        let instruction = format!(
            r#"Write a catchy name for a playlist generated from this request: "{}"

TRACKS INCLUDED:
{}

Respond with ONLY a JSON object:
{{
  "title": "Short playlist title (max 6 words)",
  "description": "One-sentence description"
}}"#,
            prompt,
            sample.join("\n")
        );

        let reply = match self.chat.complete(&instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Naming call failed: {}", e);
                return (String::new(), String::new());
            }
        };

        match parse_model_json::<NamingResponse>(&reply) {
            Ok(naming) => (naming.title, naming.description),
            Err(e) => {
                warn!("Naming reply unparseable: {}", e);
                (String::new(), String::new())
            }
        }
    }
}

fn dedup_preserving_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
