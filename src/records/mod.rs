pub mod models;
pub mod statistics;
pub mod store;

pub use models::{DrawingRecord, ExportBundle, NewDrawing, Viewport, EXPORT_VERSION};
pub use statistics::{compute_statistics, PopularLabel, Statistics};
pub use store::{RecordStore, StoreStatus};
