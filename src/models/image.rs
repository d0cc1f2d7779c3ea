use crate::error::GenerationError;
use crate::models::AspectRatio;
use serde::{Deserialize, Serialize};

/// Body of an image-only retry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateImageRequest {
    pub thought_process: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default)]
    pub thought_process: String,
    pub image_url: Option<String>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl GenerationResult {
    pub fn success(thought_process: String, image_url: Option<String>) -> Self {
        Self {
            success: true,
            thought_process,
            image_url,
            error: None,
            warnings: Vec::new(),
        }
    }

    pub fn failure(err: &GenerationError) -> Self {
        Self {
            success: false,
            thought_process: String::new(),
            image_url: None,
            error: Some(err.user_message()),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let result = GenerationResult::failure(&GenerationError::ServiceError("boom".into()));
        assert!(!result.success);
        assert!(result.thought_process.is_empty());
        assert!(result.image_url.is_none());
        assert_eq!(result.error.as_deref(), Some("Image generation failed: boom"));
    }

    #[test]
    fn test_warnings_omitted_when_empty() {
        let json = serde_json::to_value(GenerationResult::success("t".into(), None)).unwrap();
        assert!(json.get("warnings").is_none());
        assert_eq!(json["image_url"], serde_json::Value::Null);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_regenerate_request_defaults_ratio() {
        let request: RegenerateImageRequest =
            serde_json::from_str(r#"{"thought_process": "draw it"}"#).unwrap();
        assert_eq!(request.aspect_ratio, AspectRatio::Portrait3x4);
    }
}
