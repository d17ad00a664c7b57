use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HEIC/HEIF transcoder not available: {0}")]
    TranscoderUnavailable(String),

    #[error("HEIC/HEIF conversion failed: {0}")]
    TranscodeFailed(String),

    #[error("validation failed: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
