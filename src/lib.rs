//! exif_info - file-intake and EXIF metadata projection
//!
//! Accepts batches of image files (standard raster, HEIC/HEIF, vendor RAW),
//! runs one asynchronous analysis pipeline per accepted file, and renders
//! the results as HTML fragments: preview tiles for the batch and a
//! metadata modal per file. EXIF parsing is delegated to kamadak-exif and
//! HEIC decoding to libheif; nothing here parses binary formats itself.

pub mod error;
pub mod heic;
pub mod intake;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod render;
pub mod service;
pub mod store;
pub mod validation;

pub use error::PipelineError;
pub use intake::{BatchReceipt, CandidateFile, FormatClass, IntakeController};
pub use metadata::ExifSummary;
pub use pipeline::PipelineConfig;
pub use service::{ExifInfoApp, Request, Response, Service};
pub use store::{AnalysisRecord, BatchStore, StoreStatus};

pub type Result<T> = std::result::Result<T, error::PipelineError>;
