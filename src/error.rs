use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Reference image not found: {0}")]
    NotFound(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::ServiceError(err.to_string())
    }
}

impl GenerationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GenerationError::NotFound(_))
    }

    /// Message returned to the caller in a failed result.
    ///
    /// Service failures are matched against a few well-known markers in the
    /// raw detail; anything else keeps the raw detail behind a generic prefix.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::ConfigError(msg) | GenerationError::ValidationError(msg) => {
                msg.clone()
            }
            GenerationError::NotFound(_) => self.to_string(),
            GenerationError::ServiceError(detail) => {
                let upper = detail.to_ascii_uppercase();
                if upper.contains("API_KEY") {
                    "Invalid or missing Gemini API key. Check the GEMINI_API_KEY setting."
                        .to_string()
                } else if upper.contains("RATE_LIMIT") {
                    "Rate limit exceeded. Please wait a moment and try again.".to_string()
                } else if upper.contains("QUOTA") {
                    "API quota exhausted. Check your plan and billing details.".to_string()
                } else {
                    format!("Image generation failed: {}", detail)
                }
            }
            other => format!("Image generation failed: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_classification() {
        let key = GenerationError::ServiceError("400 API_KEY_INVALID".into());
        assert!(key.user_message().contains("API key"));

        let rate = GenerationError::ServiceError("RATE_LIMIT_EXCEEDED".into());
        assert!(rate.user_message().starts_with("Rate limit"));

        let quota = GenerationError::ServiceError("429: Quota exceeded for metric".into());
        assert!(quota.user_message().contains("quota"));
    }

    #[test]
    fn test_unknown_service_error_keeps_detail() {
        let err = GenerationError::ServiceError("connection reset".into());
        assert_eq!(
            err.user_message(),
            "Image generation failed: connection reset"
        );
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = GenerationError::ValidationError("Exactly 4 scenes must be provided".into());
        assert_eq!(err.user_message(), "Exactly 4 scenes must be provided");
        assert!(!err.is_not_found());
    }
}
