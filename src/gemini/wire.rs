//! Gemini `streamGenerateContent` payload types.

use crate::{
    error::{GenerationError, Result},
    models::{ImageGenerationConfig, RequestPart, StreamChunk},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Variant order matters for `#[serde(untagged)]` encoding of the two shapes.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
    pub image_size: String,
}

impl GenerateContentRequest {
    pub fn new(parts: &[RequestPart], config: &ImageGenerationConfig) -> Self {
        let parts = parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::Image { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: BASE64.encode(data),
                    },
                },
            })
            .collect();

        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: config.aspect_ratio.as_str().to_string(),
                    image_size: config.image_size.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// Response parts are classified by which payload field is present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GenerateContentResponse {
    /// Flattens every part of every candidate into chunks, keeping order.
    pub fn into_chunks(self) -> Result<Vec<StreamChunk>> {
        if let Some(error) = self.error {
            return Err(GenerationError::ServiceError(format!(
                "{} {} {}",
                error.code.map(|c| c.to_string()).unwrap_or_default(),
                error.status,
                error.message
            )
            .trim()
            .to_string()));
        }
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::ServiceError(format!(
                "Prompt was blocked by the service: {}",
                reason
            )));
        }

        let mut chunks = Vec::new();
        for candidate in self.candidates {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                if reason != "STOP" {
                    log::debug!("Candidate finished with reason {}", reason);
                }
            }
            let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
            for part in parts {
                chunks.push(part.into_chunk()?);
            }
        }
        if chunks.is_empty() {
            chunks.push(StreamChunk::Empty);
        }
        Ok(chunks)
    }
}

impl ResponsePart {
    fn into_chunk(self) -> Result<StreamChunk> {
        if let Some(inline) = self.inline_data.filter(|inline| !inline.data.is_empty()) {
            let data = BASE64.decode(inline.data.as_bytes()).map_err(|e| {
                GenerationError::ServiceError(format!("Malformed image payload in stream: {}", e))
            })?;
            return Ok(StreamChunk::Image {
                mime_type: inline.mime_type,
                data,
            });
        }
        match self.text {
            Some(text) if !text.is_empty() => Ok(StreamChunk::Text(text)),
            _ => Ok(StreamChunk::Empty),
        }
    }
}
