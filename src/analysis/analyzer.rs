use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time;

use super::{
    classifier::{classify, suggest, RandomSource, SystemRandom, SUPPORTED_FISH_TYPES},
    features::{extract_features, FeatureSet},
};
use crate::{error::PadResult, raster::RasterBuffer, settings::Settings, warmup::WarmUp};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const COMPONENT: &str = "fish analyzer";

/// Outcome of one analysis call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "fishType", alias = "label")]
    pub label: String,
    pub confidence: f64,
    pub score: u32,
    pub features: FeatureSet,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub is_loaded: bool,
    pub supported_types: Vec<String>,
}

/// Feature extraction plus heuristic classification behind a simulated
/// model warm-up.
pub struct FishAnalyzer {
    warmup: WarmUp,
    rng: Mutex<Box<dyn RandomSource>>,
    analysis_delay: Duration,
}

impl FishAnalyzer {
    /// Starts the model warm-up immediately; requires a tokio runtime.
    pub fn new(settings: &Settings) -> Self {
        Self::with_random(settings, Box::new(SystemRandom::new()))
    }

    pub fn with_random(settings: &Settings, rng: Box<dyn RandomSource>) -> Self {
        let analyzer = Self {
            warmup: WarmUp::new(COMPONENT, settings.model_warmup()),
            rng: Mutex::new(rng),
            analysis_delay: settings.analysis_delay(),
        };
        analyzer.warmup.begin(load_model());
        analyzer
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            is_loaded: self.warmup.is_ready(),
            supported_types: SUPPORTED_FISH_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub async fn wait_until_ready(&self) -> PadResult<()> {
        self.warmup.wait().await
    }

    /// Unloads the model and runs the warm-up again.
    pub async fn reset(&self) -> PadResult<()> {
        log_info!("Resetting {COMPONENT}");
        self.warmup.restart(load_model());
        self.warmup.wait().await
    }

    /// Fails with `NotReady` until the warm-up has finished. Never fails on
    /// raster content; an empty buffer yields zeroed features.
    pub async fn analyze(&self, buffer: &RasterBuffer) -> PadResult<AnalysisResult> {
        self.warmup.ensure_ready()?;

        if !self.analysis_delay.is_zero() {
            time::sleep(self.analysis_delay).await;
        }

        let features = extract_features(buffer);
        let classification = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            classify(&features, rng.as_mut())
        };
        log_debug!("Extracted features {features:?}");

        let result = AnalysisResult {
            suggestions: suggest(classification.score),
            label: classification.label,
            confidence: classification.confidence,
            score: classification.score,
            features,
            timestamp: Utc::now(),
        };

        log_info!(
            "Analysis complete: {} (confidence {:.2}, score {})",
            result.label,
            result.confidence,
            result.score
        );
        Ok(result)
    }
}

/// Stands in for loading model weights; there are none.
async fn load_model() -> anyhow::Result<()> {
    Ok(())
}
