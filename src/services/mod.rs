pub mod behavior;
pub mod categorizer;
pub mod providers;
pub mod recommendations;
pub mod scorer;
pub mod similarity;

pub use behavior::{BehaviorAggregator, BehaviorSignals};
pub use categorizer::Categorizer;
pub use recommendations::RecommendationEngine;
pub use scorer::MatchScorer;
pub use similarity::SimilarityTables;
