use aniso_diffusion::FilterError;
use thiserror::Error;

/// Errors from loading, converting and storing images.
#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("PNG decode error: {0}")]
    Decode(String),

    #[error("PNG encode error: {0}")]
    Encode(String),

    #[error("unsupported PNG layout: {0}")]
    UnsupportedLayout(String),

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
