use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{sync::Mutex, time};
use uuid::Uuid;

use super::{
    models::{DrawingRecord, ExportBundle, NewDrawing, EXPORT_VERSION},
    statistics::{compute_statistics, Statistics},
};
use crate::{
    db::Database,
    error::{PadError, PadResult},
    settings::Settings,
    warmup::WarmUp,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const COMPONENT: &str = "drawing store";
const ID_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub is_initialized: bool,
    pub mode: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Latency {
    save: Duration,
    history: Duration,
    statistics: Duration,
    delete: Duration,
}

/// Drawing history kept in memory and mirrored, as one JSON blob, into the
/// durable key-value store.
///
/// The record list lock is held across every persist, so concurrent writers
/// are serialized and a failed write is rolled back before the lock is released.
pub struct RecordStore {
    db: Database,
    storage_key: Arc<str>,
    records: Arc<Mutex<Vec<DrawingRecord>>>,
    warmup: WarmUp,
    latency: Latency,
    history_limit: usize,
}

impl RecordStore {
    /// Starts loading persisted records after the store warm-up delay.
    /// Requires a tokio runtime.
    pub fn new(db: Database, settings: &Settings) -> Self {
        let store = Self {
            db,
            storage_key: Arc::from(settings.storage_key.as_str()),
            records: Arc::new(Mutex::new(Vec::new())),
            warmup: WarmUp::new(COMPONENT, settings.store_warmup()),
            latency: Latency {
                save: Duration::from_millis(settings.save_delay_ms),
                history: Duration::from_millis(settings.history_delay_ms),
                statistics: Duration::from_millis(settings.statistics_delay_ms),
                delete: Duration::from_millis(settings.delete_delay_ms),
            },
            history_limit: settings.history_limit,
        };
        store.warmup.begin(store.load_task());
        store
    }

    pub fn is_ready(&self) -> bool {
        self.warmup.is_ready()
    }

    /// Resolves once the load finishes; a failed read surfaces as `StorageFailure`.
    pub async fn wait_until_ready(&self) -> PadResult<()> {
        self.warmup.wait().await
    }

    /// Drops the in-memory copy and reloads it from storage after a fresh warm-up.
    pub async fn reload(&self) -> PadResult<()> {
        self.warmup.restart(self.load_task());
        self.warmup.wait().await
    }

    fn load_task(&self) -> impl std::future::Future<Output = anyhow::Result<()>> + Send + 'static {
        let db = self.db.clone();
        let key = Arc::clone(&self.storage_key);
        let records = Arc::clone(&self.records);

        async move {
            let stored = db
                .get_value(&key)
                .await
                .context("failed to read persisted drawings")?;

            let loaded = match stored {
                Some(stored) => match serde_json::from_str::<Vec<DrawingRecord>>(&stored.value) {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        log_error!("Discarding unreadable drawing history under {key}: {err}");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };

            log_info!("Loaded {} drawing records", loaded.len());
            *records.lock().await = loaded;
            Ok(())
        }
    }

    async fn persist(&self, records: &[DrawingRecord]) -> anyhow::Result<()> {
        let serialized =
            serde_json::to_string(records).context("failed to serialize drawing records")?;
        self.db
            .put_value(&self.storage_key, serialized)
            .await
            .context("failed to persist drawing records")
    }

    async fn simulate_latency(delay: Duration) {
        if !delay.is_zero() {
            time::sleep(delay).await;
        }
    }

    /// Appends a record and persists the full set. Returns the new id.
    pub async fn save(&self, drawing: NewDrawing) -> PadResult<String> {
        self.warmup.ensure_ready()?;
        Self::simulate_latency(self.latency.save).await;

        let mut records = self.records.lock().await;
        let id = unique_id(&records);
        records.push(drawing.into_record(id.clone(), Utc::now()));

        if let Err(err) = self.persist(&records).await {
            records.pop();
            log_error!("Failed to save drawing {id}: {err:#}");
            return Err(err.into());
        }

        log_info!("Saved drawing {id} ({} stored)", records.len());
        Ok(id)
    }

    /// Newest first, at most `limit` records (defaults to the configured limit).
    pub async fn history(&self, limit: Option<usize>) -> PadResult<Vec<DrawingRecord>> {
        self.warmup.ensure_ready()?;
        Self::simulate_latency(self.latency.history).await;

        let mut recent = self.records.lock().await.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit.unwrap_or(self.history_limit));
        Ok(recent)
    }

    pub async fn statistics(&self) -> PadResult<Statistics> {
        self.warmup.ensure_ready()?;
        Self::simulate_latency(self.latency.statistics).await;

        let records = self.records.lock().await;
        Ok(compute_statistics(&records, &Local::now()))
    }

    /// Removes the first record with `id`.
    pub async fn delete(&self, id: &str) -> PadResult<bool> {
        self.warmup.ensure_ready()?;
        Self::simulate_latency(self.latency.delete).await;

        let mut records = self.records.lock().await;
        let index = records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| PadError::NotFound(id.to_string()))?;

        let removed = records.remove(index);
        if let Err(err) = self.persist(&records).await {
            records.insert(index, removed);
            log_error!("Failed to delete drawing {id}: {err:#}");
            return Err(err.into());
        }

        log_info!("Deleted drawing {id}");
        Ok(true)
    }

    /// Empties the store and removes the persisted blob.
    pub async fn clear(&self) -> PadResult<()> {
        self.warmup.ensure_ready()?;

        let mut records = self.records.lock().await;
        self.db
            .remove_value(&self.storage_key)
            .await
            .context("failed to remove persisted drawings")?;
        let cleared = records.len();
        records.clear();

        log_info!("Cleared {cleared} drawing records");
        Ok(())
    }

    pub async fn export(&self) -> PadResult<ExportBundle> {
        self.warmup.ensure_ready()?;

        Ok(ExportBundle {
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
            data: self.records.lock().await.clone(),
        })
    }

    pub async fn export_json(&self) -> PadResult<String> {
        let bundle = self.export().await?;
        let json = serde_json::to_string_pretty(&bundle).context("failed to serialize export")?;
        Ok(json)
    }

    /// Appends every record in `blob["data"]` without deduplication. The blob
    /// is validated in full first: one malformed record rejects the import and
    /// nothing is appended. Returns the number of imported records.
    pub async fn import(&self, blob: &Value) -> PadResult<usize> {
        self.warmup.ensure_ready()?;
        let incoming = parse_import(blob)?;

        let mut records = self.records.lock().await;
        let previous_len = records.len();
        records.extend(incoming);

        if let Err(err) = self.persist(&records).await {
            records.truncate(previous_len);
            log_error!("Failed to import drawings: {err:#}");
            return Err(err.into());
        }

        let imported = records.len() - previous_len;
        log_info!("Imported {imported} drawing records");
        Ok(imported)
    }

    pub async fn import_json(&self, json: &str) -> PadResult<usize> {
        let blob: Value = serde_json::from_str(json)
            .map_err(|err| PadError::invalid(format!("import is not valid JSON: {err}")))?;
        self.import(&blob).await
    }

    pub async fn status(&self) -> StoreStatus {
        StoreStatus {
            is_initialized: self.warmup.is_ready(),
            mode: "offline".into(),
            record_count: self.records.lock().await.len(),
        }
    }
}

fn parse_import(blob: &Value) -> PadResult<Vec<DrawingRecord>> {
    let items = blob
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| PadError::invalid("import must contain a `data` list of drawing records"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            DrawingRecord::deserialize(item).map_err(|err| {
                log_warn!("Rejecting import: record {index} is malformed: {err}");
                PadError::invalid(format!("record {index} is malformed: {err}"))
            })
        })
        .collect()
}

/// `drawing_<unix millis>_<random suffix>`, regenerated on the (unlikely)
/// clash with a stored id.
fn unique_id(existing: &[DrawingRecord]) -> String {
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!(
            "drawing_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..ID_SUFFIX_LEN]
        );
        if !existing.iter().any(|record| record.id == id) {
            return id;
        }
    }
}
