pub mod analyzer;
pub mod classifier;
pub mod features;

pub use analyzer::{AnalysisResult, FishAnalyzer, ModelStatus};
pub use classifier::{classify, suggest, Classification, RandomSource, SystemRandom};
pub use features::{extract_features, FeatureSet};
