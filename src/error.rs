pub type TraceResult<T> = Result<T, TraceError>;

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("dimension mismatch: expected {expected} bytes, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("pixel ({x}, {y}) out of bounds for {width}x{height} raster")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    #[error("invalid step request: {0}")]
    InvalidStepRequest(String),

    #[error("unknown shape type: {0}")]
    UnknownShapeType(String),

    #[error("invalid {kind} data: {reason}")]
    InvalidShapeData { kind: String, reason: String },

    #[error("session has not been initialized")]
    NotInitialized,

    #[error("worker error: {0}")]
    Worker(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TraceError {
    pub fn invalid_step(msg: impl Into<String>) -> Self {
        Self::InvalidStepRequest(msg.into())
    }

    pub fn invalid_shape(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidShapeData {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TraceError::invalid_step("x")
                .to_string()
                .contains("invalid step request:")
        );
        assert!(
            TraceError::DimensionMismatch { expected: 16, actual: 3 }
                .to_string()
                .contains("expected 16 bytes, got 3")
        );
        assert!(
            TraceError::invalid_shape("Ellipse", "too short")
                .to_string()
                .contains("invalid Ellipse data: too short")
        );
    }

    #[test]
    fn io_errors_are_transparent() {
        let err: TraceError = std::io::Error::other("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
