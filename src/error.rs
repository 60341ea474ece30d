use crate::config::ConfigError;
use crate::overlay::OverlayError;
use crate::vision::VisionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("console I/O failed: {0}")]
    Console(#[from] std::io::Error),
}

impl AppError {
    /// Fatal errors end the session; the rest only end the current iteration.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Vision(VisionError::Unauthorized(_))
                | AppError::Console(_)
        )
    }
}
