//! Per-file metadata pipeline
//!
//! Each accepted file runs one of three paths, selected at intake:
//!
//! - standard: read bytes, render a preview tile, then extract tags
//! - HEIC/HEIF: transcode to JPEG first, then continue as standard
//! - RAW: keep the placeholder tile, extract tags from the original bytes
//!
//! A fixed delay sits between the preview tile and the tag walk so a
//! consuming front end can paint the preview first. Every write back into
//! the batch goes through the store's generation guard; a task that
//! outlives its batch discards its result instead of contaminating the
//! next one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, warn};

use crate::heic::Transcoder;
use crate::intake::FormatClass;
use crate::metadata;
use crate::metrics::Metrics;
use crate::render;
use crate::store::{AnalysisRecord, BatchStore};

/// Pipeline tuning shared by all files of a batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// JPEG quality for transcoded HEIC/HEIF frames (1-100).
    pub heic_quality: u8,
    /// Pause between preview rendering and tag extraction.
    pub extraction_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            heic_quality: 80,
            extraction_delay: Duration::from_millis(100),
        }
    }
}

/// One file's pipeline run. Owns everything it needs so the intake can
/// fire-and-forget it onto the runtime.
pub(crate) struct FileTask {
    pub store: Arc<BatchStore>,
    pub metrics: Arc<Metrics>,
    pub transcoder: Option<Arc<Transcoder>>,
    pub config: PipelineConfig,
    pub generation: u64,
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    pub class: FormatClass,
}

impl FileTask {
    pub(crate) async fn run(self) {
        match self.class {
            FormatClass::Heic => self.run_heic().await,
            FormatClass::Raw => self.run_raw().await,
            _ => self.run_standard().await,
        }
    }

    async fn run_standard(self) {
        let Some(bytes) = self.read_bytes().await else {
            return;
        };
        self.preview_then_extract(bytes).await;
    }

    async fn run_heic(self) {
        let Some(transcoder) = self.transcoder.clone() else {
            warn!(file = %self.name, "HEIC file submitted without a transcoder");
            self.set_tile(render::error_tile(
                &self.name,
                render::MSG_TRANSCODER_UNAVAILABLE,
            ));
            return;
        };
        let Some(bytes) = self.read_bytes().await else {
            return;
        };
        let converted = match transcoder.to_jpeg(&bytes, self.config.heic_quality) {
            Ok(jpeg) => jpeg,
            Err(err) => {
                warn!(file = %self.name, error = %err, "HEIC conversion failed");
                self.set_tile(render::error_tile(&self.name, render::MSG_TRANSCODE_FAILED));
                return;
            }
        };
        self.preview_then_extract(converted).await;
    }

    /// RAW pixels are never decoded; the placeholder tile from intake
    /// stays and only the tags are read.
    async fn run_raw(self) {
        tokio::time::sleep(self.config.extraction_delay).await;
        let Some(bytes) = self.read_bytes().await else {
            return;
        };
        self.extract_and_store(&bytes);
    }

    async fn preview_then_extract(self, bytes: Vec<u8>) {
        let mime = detect_mime(&bytes, &self.name);
        let data_url = format!("data:{mime};base64,{}", BASE64.encode(&bytes));
        self.set_tile(render::preview_tile(
            &self.name,
            &data_url,
            bytes.len() as u64,
            self.index,
        ));

        tokio::time::sleep(self.config.extraction_delay).await;
        self.extract_and_store(&bytes);
    }

    fn extract_and_store(&self, bytes: &[u8]) {
        let summary = metadata::read_summary(bytes);
        let record = AnalysisRecord {
            file_name: self.name.clone(),
            summary,
        };
        if self.store.insert_record(self.generation, self.index, record) {
            debug!(file = %self.name, index = self.index, "analysis result stored");
        } else {
            self.metrics.record_stale_discard();
            debug!(
                file = %self.name,
                generation = self.generation,
                "discarding result from superseded batch"
            );
        }
    }

    async fn read_bytes(&self) -> Option<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(file = %self.name, error = %err, "failed to read file");
                self.set_tile(render::error_tile(&self.name, render::MSG_UNREADABLE_FILE));
                None
            }
        }
    }

    fn set_tile(&self, html: String) {
        if !self.store.set_tile(self.generation, self.index, html) {
            self.metrics.record_stale_discard();
        }
    }
}

/// Media type for the preview data URL: magic bytes first, extension table
/// as a fallback.
fn detect_mime(bytes: &[u8], name: &str) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    mime_from_extension(name).to_string()
}

/// Declared-extension fallback for files `infer` does not recognize.
fn mime_from_extension(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tiff" | "tif" => "image/tiff",
        "bmp" => "image/bmp",
        "heic" | "heif" => "image/heic",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
