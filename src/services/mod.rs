pub mod criteria_builder;
pub mod emoji;
pub mod explicit;
pub mod filter_engine;
pub mod playlist;
pub mod prompt_analyzer;
pub mod semantic;
pub mod strategy;
pub mod vector_search;

pub use criteria_builder::CriteriaBuilder;
pub use emoji::EmojiAnalyzer;
pub use explicit::ExplicitSignalExtractor;
pub use filter_engine::EnhancedFilterEngine;
pub use playlist::{PlaylistGenerator, PlaylistResult};
pub use prompt_analyzer::PromptAnalyzer;
pub use semantic::DeepSemanticAnalyzer;
pub use strategy::{GeneratedPlaylist, GenerationProgress, Strategy, StrategyPipeline};
pub use vector_search::VectorSearchEngine;
