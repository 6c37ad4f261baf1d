//! Central error handling for forge3d-tilestyle
//!
//! Errors only surface at construction and decoding boundaries: parsing a style
//! document, validating a color bin table, or decoding a tile payload. The
//! per-frame styling pass never fails.

/// Errors raised while building styles or decoding tile content
#[derive(thiserror::Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl StyleError {
    pub fn invalid_style<T: ToString>(msg: T) -> Self {
        StyleError::InvalidStyle(msg.to_string())
    }

    pub fn invalid_content<T: ToString>(msg: T) -> Self {
        StyleError::InvalidContent(msg.to_string())
    }

    pub fn unsupported<T: ToString>(msg: T) -> Self {
        StyleError::Unsupported(msg.to_string())
    }
}

/// Result type alias for style and content operations
pub type StyleResult<T> = Result<T, StyleError>;
