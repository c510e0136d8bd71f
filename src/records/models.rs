//! Persisted drawing records and the export envelope.
//!
//! JSON keys match the blob written by earlier versions of the pad, so old
//! exports import cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A saved drawing. Identity is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Encoded raster, normally a PNG data URI. Not interpreted by the store.
    pub image_data: String,
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub viewport: Viewport,
}

impl DrawingRecord {
    pub fn score(&self) -> Option<u32> {
        self.analysis_result.as_ref().map(|result| result.score)
    }

    pub fn label(&self) -> Option<&str> {
        self.analysis_result
            .as_ref()
            .map(|result| result.label.as_str())
    }
}

/// Caller-supplied part of a record; the store adds id and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDrawing {
    pub image_data: String,
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub viewport: Viewport,
}

impl NewDrawing {
    pub fn into_record(self, id: String, timestamp: DateTime<Utc>) -> DrawingRecord {
        DrawingRecord {
            id,
            timestamp,
            image_data: self.image_data,
            analysis_result: self.analysis_result,
            user_agent: self.user_agent,
            viewport: self.viewport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub data: Vec<DrawingRecord>,
}
