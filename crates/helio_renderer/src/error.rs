use helio_math::Vec3;
use thiserror::Error;

/// Errors that can occur while rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Inconsistent pdf {pdf} for direction {direction} sampled at {position}")]
    InconsistentPdf {
        position: Vec3,
        direction: Vec3,
        pdf: f32,
    },

    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
