//! Error types for the print pipeline

use shared::models::PayloadError;
use thiserror::Error;

/// Rasterization error (markup → SVG → PNG)
#[derive(Debug, Error)]
pub enum RenderError {
    /// Markup could not be typeset
    #[error("Invalid markup: {0}")]
    Markup(String),

    /// Generated SVG was rejected by the parser
    #[error("SVG parse failed: {0}")]
    Svg(String),

    /// Pixmap allocation or PNG encoding failed
    #[error("Raster failed: {0}")]
    Raster(String),

    /// Artifact could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Job source error
#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job source returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Top-level error of one job cycle
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    JobSource(#[from] JobSourceError),

    #[error("Rasterization failed: {0}")]
    Render(#[from] RenderError),

    #[error("Job folder error: {0}")]
    JobFolder(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
