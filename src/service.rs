//! Service interface for exif_info
//!
//! Exposes the intake pipeline and the projector as named operations with a
//! standardized JSON request/response shape, so the daemon (or an embedding
//! host) can drive them without touching the pipeline types directly.
//!
//! ## Available Operations
//!
//! 1. `batch.submit` - submit a new batch of files for analysis
//! 2. `batch.tiles` - render the current preview area
//! 3. `batch.inspect` - render the analysis modal for one batch index
//! 4. `batch.status` - batch progress counters
//! 5. `service.capabilities` - capability card query
//!
//! ## Example
//!
//! ```rust,no_run
//! use exif_info::service::{ExifInfoApp, Request, Service};
//! use exif_info::pipeline::PipelineConfig;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = ExifInfoApp::new(PipelineConfig::default());
//!
//! let response = app.dispatch(Request {
//!     op: "batch.submit".to_string(),
//!     input: json!({"files": [{"path": "holiday.jpg"}]}),
//! }).await?;
//! assert!(response.ok);
//! # Ok(())
//! # }
//! ```

use crate::intake::{CandidateFile, IntakeController};
use crate::metrics::Metrics;
use crate::pipeline::PipelineConfig;
use crate::render;
use crate::store::BatchStore;
use crate::validation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

/// Request - input to service operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub op: String,
    pub input: Value,
}

/// Response - output from service operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    pub output: Value,
    pub latency_ms: u64,
}

/// Service trait implemented by the application facade
#[async_trait]
pub trait Service: Send + Sync {
    async fn dispatch(&self, request: Request) -> Result<Response, ServiceError>;
    fn describe(&self) -> ServiceCard;
}

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Service capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCard {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tags: Vec<String>,
    pub functions: Vec<FunctionCard>,
}

/// Function capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCard {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub idempotent: bool,
    pub side_effects: Vec<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Value,
}

/// Application facade: owns the store, the intake controller and the
/// metrics, and projects results on demand. Constructed once and shared;
/// there is no process-global instance.
pub struct ExifInfoApp {
    intake: IntakeController,
    store: Arc<BatchStore>,
    metrics: Arc<Metrics>,
}

impl ExifInfoApp {
    pub fn new(config: PipelineConfig) -> Self {
        let store = Arc::new(BatchStore::new());
        let metrics = Metrics::new();
        let intake = IntakeController::new(Arc::clone(&store), Arc::clone(&metrics), config);
        Self {
            intake,
            store,
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle batch.submit operation
    fn handle_batch_submit(&self, input: Value) -> Result<Value, ServiceError> {
        let entries = input["files"]
            .as_array()
            .ok_or_else(|| ServiceError::InvalidInput("Missing files".to_string()))?;

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry["path"]
                .as_str()
                .ok_or_else(|| ServiceError::InvalidInput("File entry missing path".to_string()))?;
            files.push(CandidateFile {
                path: PathBuf::from(path),
                name: entry["name"].as_str().map(str::to_string),
                mime: entry["mime"].as_str().map(str::to_string),
            });
        }

        let receipt = self.intake.submit(files);
        Ok(serde_json::to_value(receipt)?)
    }

    /// Handle batch.tiles operation
    fn handle_batch_tiles(&self) -> Result<Value, ServiceError> {
        Ok(json!({
            "generation": self.store.generation(),
            "html": self.store.tiles_html(),
        }))
    }

    /// Handle batch.inspect operation - project one stored record as a modal
    fn handle_batch_inspect(&self, input: Value) -> Result<Value, ServiceError> {
        let index = input["index"]
            .as_u64()
            .ok_or_else(|| ServiceError::InvalidInput("Missing index".to_string()))?
            as usize;

        match self.store.record(index) {
            Some(record) => Ok(json!({
                "found": true,
                "index": index,
                "file_name": record.file_name,
                "modal": render::modal(&record, index),
            })),
            None => {
                // Non-fatal: the pipeline may not have finished, or the
                // index never existed in this batch
                warn!(index, "no analysis result for index");
                Ok(json!({ "found": false, "index": index }))
            }
        }
    }

    /// Handle batch.status operation
    fn handle_batch_status(&self) -> Result<Value, ServiceError> {
        Ok(serde_json::to_value(self.store.status())?)
    }

    /// Handle service.capabilities operation
    fn handle_capabilities(&self) -> Result<Value, ServiceError> {
        let card = self.describe();
        serde_json::to_value(&card).map_err(ServiceError::SerializationError)
    }
}

/// Input schema for an operation, used both for pre-dispatch validation
/// and for the capability card.
fn input_schema(op: &str) -> Option<Value> {
    match op {
        "batch.submit" => Some(json!({
            "type": "object",
            "properties": {
                "files": {
                    "type": "array",
                    "description": "Candidate files: {path, name?, mime?} each"
                }
            },
            "required": ["files"]
        })),
        "batch.inspect" => Some(json!({
            "type": "object",
            "properties": {
                "index": { "type": "integer", "description": "Zero-based batch index" }
            },
            "required": ["index"]
        })),
        _ => None,
    }
}

#[async_trait]
impl Service for ExifInfoApp {
    async fn dispatch(&self, request: Request) -> Result<Response, ServiceError> {
        let start = Instant::now();
        let op = request.op.clone();

        if let Some(schema) = input_schema(&op) {
            validation::validate_input(&request.input, &schema)
                .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        }

        let result = match request.op.as_str() {
            "batch.submit" => self.handle_batch_submit(request.input)?,
            "batch.tiles" => self.handle_batch_tiles()?,
            "batch.inspect" => self.handle_batch_inspect(request.input)?,
            "batch.status" => self.handle_batch_status()?,
            "service.capabilities" => self.handle_capabilities()?,
            "metrics" => json!(self.metrics.snapshot()),
            _ => {
                let latency = start.elapsed().as_millis() as u64;
                self.metrics.record_request(&op, false, latency);

                return Ok(Response {
                    ok: false,
                    output: json!({
                        "error": "UnsupportedOperation",
                        "op": request.op,
                        "available_operations": [
                            "batch.submit",
                            "batch.tiles",
                            "batch.inspect",
                            "batch.status",
                            "service.capabilities",
                            "metrics"
                        ]
                    }),
                    latency_ms: latency,
                });
            }
        };

        let latency = start.elapsed().as_millis() as u64;
        self.metrics.record_request(&op, true, latency);

        Ok(Response {
            ok: true,
            output: result,
            latency_ms: latency,
        })
    }

    fn describe(&self) -> ServiceCard {
        ServiceCard {
            name: "exif_info".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "File-intake and EXIF metadata projection service for image batches"
                .to_string(),
            tags: vec![
                "exif".to_string(),
                "metadata".to_string(),
                "image".to_string(),
                "heic".to_string(),
                "raw".to_string(),
                "gps".to_string(),
            ],
            functions: vec![
                FunctionCard {
                    name: "batch.submit".to_string(),
                    description: "Submit a batch of image files; clears prior results and runs one analysis pipeline per accepted file".to_string(),
                    tags: vec!["batch".to_string(), "intake".to_string()],
                    idempotent: false,
                    side_effects: vec![
                        "clears the result store".to_string(),
                        "reads submitted files".to_string(),
                        "spawns pipeline tasks".to_string(),
                    ],
                    input_schema: input_schema("batch.submit"),
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "generation": { "type": "integer" },
                            "submitted": { "type": "integer" },
                            "accepted": { "type": "integer" },
                            "rejected": { "type": "integer" }
                        }
                    }),
                },
                FunctionCard {
                    name: "batch.tiles".to_string(),
                    description: "Render the preview area for the current batch as one HTML fragment, tiles in batch order".to_string(),
                    tags: vec!["batch".to_string(), "render".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "generation": { "type": "integer" },
                            "html": { "type": "string" }
                        }
                    }),
                },
                FunctionCard {
                    name: "batch.inspect".to_string(),
                    description: "Render the analysis modal for one batch index; found=false when no record exists for it".to_string(),
                    tags: vec!["batch".to_string(), "render".to_string(), "exif".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: input_schema("batch.inspect"),
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "found": { "type": "boolean" },
                            "index": { "type": "integer" },
                            "file_name": { "type": "string" },
                            "modal": { "type": "string" }
                        }
                    }),
                },
                FunctionCard {
                    name: "batch.status".to_string(),
                    description: "Progress counters for the current batch: generation, file count, completed records".to_string(),
                    tags: vec!["batch".to_string(), "status".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "generation": { "type": "integer" },
                            "files": { "type": "integer" },
                            "completed": { "type": "integer" },
                            "submitted_at": { "type": "string" }
                        }
                    }),
                },
                FunctionCard {
                    name: "service.capabilities".to_string(),
                    description: "Return the capability card with all available functions".to_string(),
                    tags: vec!["metadata".to_string(), "discovery".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "version": { "type": "string" },
                            "functions": { "type": "array" }
                        }
                    }),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_service_capabilities() {
        let app = ExifInfoApp::new(PipelineConfig::default());
        let request = Request {
            op: "service.capabilities".to_string(),
            input: json!({}),
        };

        let response = app.dispatch(request).await.unwrap();
        assert!(response.ok);
        assert_eq!(response.output["name"], "exif_info");
        assert!(response.output["functions"].as_array().is_some());
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let app = ExifInfoApp::new(PipelineConfig::default());
        let request = Request {
            op: "invalid.operation".to_string(),
            input: json!({}),
        };

        let response = app.dispatch(request).await.unwrap();
        assert!(!response.ok);
        assert!(response.output.get("error").is_some());
    }

    #[tokio::test]
    async fn test_submit_requires_files_field() {
        let app = ExifInfoApp::new(PipelineConfig::default());
        let request = Request {
            op: "batch.submit".to_string(),
            input: json!({}),
        };

        let result = app.dispatch(request).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_inspect_unknown_index_is_not_an_error() {
        let app = ExifInfoApp::new(PipelineConfig::default());
        let request = Request {
            op: "batch.inspect".to_string(),
            input: json!({ "index": 42 }),
        };

        let response = app.dispatch(request).await.unwrap();
        assert!(response.ok);
        assert_eq!(response.output["found"], false);
        assert_eq!(response.output["index"], 42);
    }

    #[test]
    fn test_service_card() {
        let app = ExifInfoApp::new(PipelineConfig::default());
        let card = app.describe();

        assert_eq!(card.name, "exif_info");
        assert_eq!(card.functions.len(), 5);
        assert!(card.tags.contains(&"exif".to_string()));
    }
}
