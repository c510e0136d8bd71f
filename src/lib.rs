pub mod analysis;
pub mod db;
pub mod error;
pub mod labels;
pub mod raster;
pub mod records;
pub mod settings;
pub mod utils;
pub mod warmup;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use analysis::{AnalysisResult, FishAnalyzer, ModelStatus};
use db::Database;
use error::{PadError, PadResult};
use labels::{LabelInfo, LabelTable};
use raster::RasterBuffer;
use records::{NewDrawing, RecordStore, Statistics, StoreStatus, Viewport};
use settings::{Settings, SettingsStore};

const ENABLE_LOGS: bool = true;

/// Opaque details about the client that produced a drawing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub viewport: Viewport,
}

/// An analysis joined with the reference info for its label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub fish_info: LabelInfo,
    pub confidence_percent: u32,
}

/// Dashboard view: store statistics plus the model and store status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatistics {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub model_status: ModelStatus,
    pub database_status: StoreStatus,
}

/// Owns the analyzer, label table and record store for one pad session.
pub struct DrawingPad {
    analyzer: FishAnalyzer,
    labels: LabelTable,
    store: RecordStore,
}

impl DrawingPad {
    /// Starts both warm-ups; requires a tokio runtime.
    pub fn new(db: Database, settings: &Settings) -> Self {
        Self::from_parts(FishAnalyzer::new(settings), RecordStore::new(db, settings))
    }

    pub fn from_parts(analyzer: FishAnalyzer, store: RecordStore) -> Self {
        Self {
            analyzer,
            labels: LabelTable::new(),
            store,
        }
    }

    /// Opens (or creates) `settings.json` and `fishpad.sqlite3` under `data_dir`.
    /// A missing settings file is written out with the defaults.
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings_path = data_dir.join("settings.json");
        let first_run = !settings_path.exists();
        let settings_store = SettingsStore::new(settings_path)?;
        if first_run {
            settings_store.update(settings_store.get())?;
        }
        let settings = settings_store.get().with_env_overrides();
        let db = Database::new(data_dir.join("fishpad.sqlite3"))?;
        Ok(Self::new(db, &settings))
    }

    pub fn analyzer(&self) -> &FishAnalyzer {
        &self.analyzer
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub async fn wait_until_ready(&self) -> PadResult<()> {
        let (model, store) =
            tokio::join!(self.analyzer.wait_until_ready(), self.store.wait_until_ready());
        model.and(store)
    }

    /// Rejects a blank canvas, otherwise runs the analyzer.
    pub async fn analyze_drawing(&self, raster: &RasterBuffer) -> PadResult<AnalysisResult> {
        if raster.is_empty() {
            return Err(PadError::invalid("draw a fish before asking for an analysis"));
        }
        self.analyzer.analyze(raster).await
    }

    pub fn describe(&self, result: &AnalysisResult) -> AnalysisReport {
        AnalysisReport {
            fish_info: self.labels.lookup(&result.label).clone(),
            confidence_percent: (result.confidence * 100.0).round() as u32,
            result: result.clone(),
        }
    }

    pub async fn app_statistics(&self) -> PadResult<AppStatistics> {
        Ok(AppStatistics {
            statistics: self.store.statistics().await?,
            model_status: self.analyzer.status(),
            database_status: self.store.status().await,
        })
    }

    /// Encodes the raster as a PNG data URI and stores it with the optional analysis.
    pub async fn save_drawing(
        &self,
        raster: &RasterBuffer,
        analysis: Option<AnalysisResult>,
        client: ClientEnvironment,
    ) -> PadResult<String> {
        if raster.is_empty() {
            return Err(PadError::invalid("nothing drawn yet, there is nothing to save"));
        }
        let image_data = raster
            .to_data_uri()
            .map_err(|err| PadError::invalid(format!("{err:#}")))?;

        self.store
            .save(NewDrawing {
                image_data,
                analysis_result: analysis,
                user_agent: client.user_agent,
                viewport: client.viewport,
            })
            .await
    }
}

fn data_dir() -> PathBuf {
    std::env::var_os("FISHPAD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fishpad-data"))
}

/// Analyses and stores every PNG path given on the command line, then prints
/// the aggregate statistics.
pub fn run() -> anyhow::Result<()> {
    utils::init_logging();
    log_info!("fishpad starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async {
        let pad = DrawingPad::open(&data_dir())?;
        pad.wait_until_ready().await?;

        let client = ClientEnvironment {
            user_agent: format!("fishpad-cli/{}", env!("CARGO_PKG_VERSION")),
            viewport: Viewport::default(),
        };

        for path in std::env::args().skip(1) {
            let bytes =
                std::fs::read(&path).with_context(|| format!("failed to read drawing {path}"))?;
            let raster = RasterBuffer::from_png(&bytes)?;
            let result = match pad.analyze_drawing(&raster).await {
                Ok(result) => result,
                Err(err) => {
                    log_warn!("Skipping {path}: {err}");
                    continue;
                }
            };

            let report = pad.describe(&result);
            println!("{}", serde_json::to_string_pretty(&report)?);

            let id = pad
                .save_drawing(&raster, Some(result), client.clone())
                .await?;
            log_info!("Stored {path} as {id}");
        }

        let stats = pad.app_statistics().await?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{classifier::tests::ScriptedRandom, ModelStatus};
    use crate::raster::tests::with_rect;

    async fn ready_pad(draws: &[f64]) -> DrawingPad {
        let settings = Settings::instant();
        let analyzer = FishAnalyzer::with_random(&settings, Box::new(ScriptedRandom::new(draws)));
        let store = RecordStore::new(Database::in_memory().unwrap(), &settings);
        let pad = DrawingPad::from_parts(analyzer, store);
        pad.wait_until_ready().await.unwrap();
        pad
    }

    #[tokio::test]
    async fn blank_canvas_is_rejected_before_analysis_and_save() {
        let pad = ready_pad(&[0.0]).await;
        let blank = RasterBuffer::blank(32, 32);

        assert!(matches!(
            pad.analyze_drawing(&blank).await,
            Err(PadError::InvalidInput(_))
        ));
        assert!(matches!(
            pad.save_drawing(&blank, None, ClientEnvironment::default()).await,
            Err(PadError::InvalidInput(_))
        ));
        assert_eq!(pad.store().status().await.record_count, 0);
    }

    #[tokio::test]
    async fn analyze_describe_and_save() {
        // well-formed branch picks "Goldfish", then the override swaps in "Clownfish"
        let pad = ready_pad(&[0.0, 0.5, 0.5, 0.9, 0.3]).await;
        let raster = with_rect(40, 40, 10, 10, 30, 30);

        let result = pad.analyze_drawing(&raster).await.unwrap();
        assert_eq!(result.features.coverage, 25);
        assert_eq!(result.label, "Clownfish");

        let report = pad.describe(&result);
        assert_eq!(report.fish_info.description, "A brightly coloured tropical fish");
        assert_eq!(report.confidence_percent, 90);
        assert_eq!(result.score, 93);

        let client = ClientEnvironment {
            user_agent: "test-agent".into(),
            viewport: Viewport {
                width: 1024,
                height: 768,
            },
        };
        let id = pad.save_drawing(&raster, Some(result), client).await.unwrap();

        let history = pad.store().history(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].user_agent, "test-agent");
        assert_eq!(history[0].viewport.width, 1024);

        let restored = RasterBuffer::from_data_uri(&history[0].image_data).unwrap();
        assert_eq!(restored, raster);
    }

    #[tokio::test]
    async fn unknown_labels_describe_as_generic_fish() {
        let pad = ready_pad(&[0.0, 0.0, 0.0]).await;
        let result = pad.analyzer().analyze(&RasterBuffer::blank(8, 8)).await.unwrap();
        let report = pad.describe(&result);
        assert_eq!(report.fish_info.description, "generic fish");

        let status: ModelStatus = pad.analyzer().status();
        assert!(status.is_loaded);
        assert!(pad.labels().all_labels().contains(&"Goldfish"));
    }

    #[tokio::test]
    async fn app_statistics_merges_store_and_model_status() {
        let pad = ready_pad(&[0.0, 0.5, 0.5, 0.0]).await;
        let raster = with_rect(40, 40, 10, 10, 30, 30);
        let result = pad.analyze_drawing(&raster).await.unwrap();
        pad.save_drawing(&raster, Some(result), ClientEnvironment::default())
            .await
            .unwrap();

        let dashboard = pad.app_statistics().await.unwrap();
        assert_eq!(dashboard.statistics.total_drawings, 1);
        assert!(dashboard.model_status.is_loaded);
        assert_eq!(dashboard.database_status.record_count, 1);

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["totalDrawings"], 1);
        assert_eq!(json["popularFishTypes"][0]["fishType"], "Goldfish");
        assert_eq!(json["modelStatus"]["isLoaded"], true);
        assert_eq!(json["databaseStatus"]["mode"], "offline");
    }

    #[tokio::test]
    async fn storage_failure_during_warmup_reaches_the_caller() {
        let db = Database::in_memory().unwrap();
        db.execute(|conn| {
            conn.execute_batch("DROP TABLE kv_store")?;
            Ok(())
        })
        .await
        .unwrap();

        let settings = Settings::instant();
        let pad = DrawingPad::new(db, &settings);
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(3), pad.wait_until_ready())
            .await
            .expect("startup should settle");
        assert!(matches!(outcome, Err(PadError::StorageFailure(_))));
    }

    #[tokio::test]
    async fn open_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("pad");
        let pad = DrawingPad::open(&data).unwrap();
        assert!(data.join("fishpad.sqlite3").exists());
        assert!(data.join("settings.json").exists());
        assert_eq!(pad.store().status().await.mode, "offline");
    }
}
