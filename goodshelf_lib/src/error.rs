//! Error types for the library layer.

use crate::render::RenderError;

/// Errors produced by the library layer, wrapping the rendering
/// collaborator's failures and adding URL construction and input
/// validation failures.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// The rendering collaborator could not produce a document.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    /// A listing URL could not be constructed.
    #[error("invalid listing url: {0}")]
    Url(#[from] url::ParseError),
    /// Operator-provided input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
