//! File intake
//!
//! Accepts a batch of candidate files, validates each against the format
//! allow-lists, and fans every accepted file out to its own asynchronous
//! pipeline task. All prior batch state is cleared synchronously before the
//! first task is spawned, and each file's initial tile lands in the preview
//! area in batch order even though pipelines finish in any order.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::heic::Transcoder;
use crate::metrics::Metrics;
use crate::pipeline::{FileTask, PipelineConfig};
use crate::render;
use crate::store::BatchStore;

/// Declared MIME types accepted without looking at the file name.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
    "image/svg+xml",
    "image/heic",
    "image/heif",
];

/// File name suffixes accepted without looking at the declared MIME type.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".tif",
    ".heic", ".heif", ".dng", ".cr2", ".cr3", ".nef", ".arw", ".raf",
    ".rw2", ".orf", ".pef", ".srw", ".3fr", ".fff", ".iiq", ".rwl", ".raw",
];

/// Vendor RAW suffixes. These route to the RAW path, which never attempts
/// to decode pixels.
pub const RAW_EXTENSIONS: &[&str] = &[
    ".dng", ".cr2", ".cr3", ".nef", ".arw", ".raf", ".rw2", ".orf",
    ".pef", ".srw", ".3fr", ".fff", ".iiq", ".rwl", ".raw",
];

/// Detected format class of a candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    Standard,
    Heic,
    Raw,
    Unsupported,
}

/// A file offered to the intake, as the picker or drop source described it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Display name; defaults to the path's file name.
    pub name: Option<String>,
    /// Declared MIME type, if the source provided one.
    pub mime: Option<String>,
}

impl CandidateFile {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.to_string_lossy().into_owned()),
        }
    }
}

/// Outcome of one batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub generation: u64,
    pub submitted: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// A file is acceptable when its declared MIME type is allow-listed OR its
/// lowercase name ends with an allow-listed extension. Either check alone
/// is sufficient.
pub fn is_image_file(name: &str, mime: Option<&str>) -> bool {
    let has_valid_type = mime.map(|m| ACCEPTED_MIME_TYPES.contains(&m)).unwrap_or(false);
    let file_name = name.to_lowercase();
    let has_valid_extension = ACCEPTED_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext));
    has_valid_type || has_valid_extension
}

/// Classify an accepted file. Priority order: HEIC/HEIF by substring match
/// anywhere in the name, then vendor RAW by extension, then standard.
pub fn classify(name: &str, mime: Option<&str>) -> FormatClass {
    if !is_image_file(name, mime) {
        return FormatClass::Unsupported;
    }
    let file_name = name.to_lowercase();
    if file_name.contains(".heic") || file_name.contains(".heif") {
        return FormatClass::Heic;
    }
    if RAW_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
        return FormatClass::Raw;
    }
    FormatClass::Standard
}

/// Owns the file-selection surface: validates candidates and dispatches
/// pipelines. Shared handles are injected at construction; nothing here is
/// process-global.
pub struct IntakeController {
    store: Arc<BatchStore>,
    metrics: Arc<Metrics>,
    config: PipelineConfig,
    transcoder: Option<Arc<Transcoder>>,
}

impl IntakeController {
    pub fn new(store: Arc<BatchStore>, metrics: Arc<Metrics>, config: PipelineConfig) -> Self {
        // Capability probe; a missing transcoder only degrades the HEIC path
        let transcoder = Transcoder::new().ok().map(Arc::new);
        if transcoder.is_none() {
            info!("HEIC/HEIF transcoder not available");
        }
        Self {
            store,
            metrics,
            config,
            transcoder,
        }
    }

    /// Submit a batch. The store and preview area are cleared before any
    /// pipeline task is spawned; each file then gets exactly one tile at
    /// its batch index. Rejected files keep an error tile and spawn
    /// nothing. Must be called from within a tokio runtime.
    pub fn submit(&self, files: Vec<CandidateFile>) -> BatchReceipt {
        let submitted = files.len();
        let generation = self.store.begin_batch(submitted);
        info!(generation, files = submitted, "handling new batch");

        let mut accepted = 0;
        let mut rejected = 0;

        for (index, file) in files.into_iter().enumerate() {
            let name = file.display_name();
            let class = classify(&name, file.mime.as_deref());
            debug!(file = %name, ?class, index, "processing file");

            if class == FormatClass::Unsupported {
                self.store.set_tile(
                    generation,
                    index,
                    render::error_tile(&name, render::MSG_UNSUPPORTED_FORMAT),
                );
                rejected += 1;
                continue;
            }

            let tile = match class {
                FormatClass::Raw => render::raw_placeholder_tile(&name, index),
                _ => render::pending_tile(&name),
            };
            self.store.set_tile(generation, index, tile);
            accepted += 1;

            let task = FileTask {
                store: Arc::clone(&self.store),
                metrics: Arc::clone(&self.metrics),
                transcoder: self.transcoder.clone(),
                config: self.config.clone(),
                generation,
                index,
                name,
                path: file.path,
                class,
            };
            tokio::spawn(task.run());
        }

        BatchReceipt {
            generation,
            submitted,
            accepted,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_by_extension() {
        assert!(is_image_file("photo.jpg", None));
        assert!(is_image_file("PHOTO.CR2", None));
        assert!(is_image_file("scan.TIF", None));
        assert!(!is_image_file("notes.txt", None));
        assert!(!is_image_file("clip.mp4", None));
    }

    #[test]
    fn test_acceptance_by_mime_alone() {
        // Extension check fails but the declared type is allow-listed
        assert!(is_image_file("upload.bin", Some("image/png")));
        assert!(is_image_file("notes.txt", Some("image/jpeg")));
        assert!(!is_image_file("notes.txt", Some("text/plain")));
    }

    #[test]
    fn test_raw_path_wins_over_mime() {
        // RAW routing is by name, whatever the declared type says
        assert_eq!(classify("shot.NEF", Some("image/jpeg")), FormatClass::Raw);
        assert_eq!(classify("shot.arw", None), FormatClass::Raw);
        assert_eq!(classify("shot.3fr", None), FormatClass::Raw);
    }

    #[test]
    fn test_heic_substring_wins_over_raw_extension() {
        assert_eq!(classify("IMG_0001.HEIC", None), FormatClass::Heic);
        assert_eq!(classify("export.heif", None), FormatClass::Heic);
        // ".heic" anywhere in the name takes priority over the extension
        assert_eq!(classify("copy.heic.dng", None), FormatClass::Heic);
    }

    #[test]
    fn test_standard_is_the_default_path() {
        assert_eq!(classify("photo.jpg", None), FormatClass::Standard);
        assert_eq!(classify("upload.bin", Some("image/png")), FormatClass::Standard);
        assert_eq!(classify("notes.txt", None), FormatClass::Unsupported);
    }

    #[test]
    fn test_display_name_falls_back_to_path() {
        let file = CandidateFile {
            path: PathBuf::from("/data/in/IMG_1234.heic"),
            name: None,
            mime: None,
        };
        assert_eq!(file.display_name(), "IMG_1234.heic");

        let named = CandidateFile {
            path: PathBuf::from("/tmp/upload-922"),
            name: Some("holiday.jpg".to_string()),
            mime: None,
        };
        assert_eq!(named.display_name(), "holiday.jpg");
    }
}
