pub mod analysis;
pub mod criteria;
pub mod track;

pub use analysis::{EmojiAnalysisResult, PromptAnalysisResult, SemanticAnalysisResult, Signal};
pub use criteria::{AudioFeatureBounds, EnergyRange, SongSelectionCriteria, YearRange};
pub use track::{EmbeddedTrack, SearchCandidate, TrackFeatures, TrackSummary};
