//! Playlist Generator
//!
//! Top-level request flow: analyze the prompt, build selection criteria,
//! run the embedding search plus filter pass, then hand the pool to the
//! model for final re-ranking and naming. When the semantic path yields
//! nothing (no embeddings stored, prompt too thin) the direct
//! strategy-classification path takes over.

use crate::error::{AppError, Result};
use crate::providers::{ChatProvider, EmbeddingProvider};
use crate::repository::MusicRepository;
use crate::services::criteria_builder::CriteriaBuilder;
use crate::services::filter_engine::EnhancedFilterEngine;
use crate::services::prompt_analyzer::PromptAnalyzer;
use crate::services::semantic::DeepSemanticAnalyzer;
use crate::services::strategy::{GeneratedPlaylist, GenerationProgress, StrategyPipeline};
use crate::services::vector_search::VectorSearchEngine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PlaylistResult {
    pub track_ids: Vec<Uuid>,
    pub title: String,
    pub description: String,
    pub strategy: String,
}

pub struct PlaylistGenerator {
    analyzer: PromptAnalyzer,
    criteria_builder: CriteriaBuilder,
    search: VectorSearchEngine,
    filter: EnhancedFilterEngine,
    pipeline: StrategyPipeline,
}

impl PlaylistGenerator {
    pub fn new(
        repository: Arc<dyn MusicRepository>,
        chat: Arc<dyn ChatProvider>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            analyzer: PromptAnalyzer::new(
                repository.clone(),
                DeepSemanticAnalyzer::new(chat.clone()),
            ),
            criteria_builder: CriteriaBuilder::new(repository.clone()),
            search: VectorSearchEngine::new(embeddings, repository.clone()),
            filter: EnhancedFilterEngine::new(repository.clone()),
            pipeline: StrategyPipeline::new(chat, repository),
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        target_size: usize,
        avoid_explicit: Option<bool>,
    ) -> Result<PlaylistResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Prompt must not be empty".to_string()));
        }
        if target_size == 0 {
            return Err(AppError::Validation("Target size must be at least 1".to_string()));
        }

        let analysis = self.analyzer.analyze(prompt).await?;
        let criteria = self
            .criteria_builder
            .build(prompt, &analysis, avoid_explicit)
            .await?;

        // Oversized pool so the filter and re-rank have room to drop tracks
        let candidates = self.search.search(&criteria, target_size * 2).await?;
        let pool = self
            .filter
            .filter(&criteria, &candidates, target_size * 2)
            .await?;

        if pool.is_empty() {
            info!("Semantic search produced no candidates, using direct generation");
            let direct = self.pipeline.generate(prompt, target_size).await?;
            return Ok(PlaylistResult {
                track_ids: direct.track_ids,
                title: direct.title,
                description: direct.description,
                strategy: direct.strategy.as_str().to_string(),
            });
        }

        info!("Semantic path selected {} candidates", pool.len());
        let track_ids = self.pipeline.rank(prompt, pool, target_size).await?;
        let (title, description) = self.pipeline.name_playlist(prompt, &track_ids).await;

        Ok(PlaylistResult {
            track_ids,
            title,
            description,
            strategy: "semantic".to_string(),
        })
    }

    /// Direct-generation path with streaming progress, used by the SSE
    /// endpoint.
    pub async fn generate_streaming(
        &self,
        prompt: &str,
        target_size: usize,
        progress_tx: mpsc::Sender<GenerationProgress>,
    ) -> Result<GeneratedPlaylist> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Prompt must not be empty".to_string()));
        }
        self.pipeline
            .generate_with_progress(prompt, target_size, progress_tx)
            .await
    }
}
