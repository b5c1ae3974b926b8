use tickframe_assets::AssetError;

use crate::render_type::RenderType;

/// Errors from the render layer.
///
/// Running out of batch capacity is not an error; submissions report it
/// as `false`.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no shader {name:?} registered for {render_type:?}")]
    MissingShader {
        render_type: RenderType,
        name: &'static str,
    },
    #[error("{render_type:?} cannot be used for a {expected} batch")]
    WrongBatchKind {
        render_type: RenderType,
        expected: &'static str,
    },
    #[error("GPU error: {0}")]
    Gpu(String),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}
