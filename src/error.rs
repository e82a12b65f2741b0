use thiserror::Error;

/// Main error type for VIGA
#[derive(Error, Debug)]
pub enum VigaError {
    /// Malformed geometric input found while creating nodes
    #[error("Validation error: {0}")]
    Validation(String),

    /// Semantic encoder errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Perception snapshot could not be read or parsed
    #[error("Perception error: {0}")]
    Perception(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using VigaError
pub type Result<T> = std::result::Result<T, VigaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VigaError::Validation("element_0: box has 3 coordinates".to_string());
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("element_0"));
    }

    #[test]
    fn test_perception_error_keeps_source_detail() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = VigaError::Perception(format!("Failed to read frame.json: {}", io_err));
        assert_eq!(
            err.to_string(),
            "Perception error: Failed to read frame.json: file not found"
        );
    }
}
