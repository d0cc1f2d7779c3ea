use crate::{
    config::GeminiConfig,
    error::{GenerationError, Result},
    gemini::{
        sse::SseDecoder,
        wire::{GenerateContentRequest, GenerateContentResponse},
        ChunkStream, GenerationService,
    },
    models::{ImageGenerationConfig, RequestPart, StreamChunk},
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("HTTP client: {}", e)))?;
        Self::with_http(http, config)
    }

    /// Reuses an existing HTTP connection pool.
    pub fn with_http(http: Client, config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        };
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.api_base, model_path
        )
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn parse_event(data: &str) -> Result<Vec<StreamChunk>> {
    let response: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
        GenerationError::ServiceError(format!("Malformed stream event: {}", e))
    })?;
    response.into_chunks()
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn stream_generate(
        &self,
        parts: Vec<RequestPart>,
        config: &ImageGenerationConfig,
    ) -> Result<ChunkStream> {
        let payload = GenerateContentRequest::new(&parts, config);

        log::info!(
            "Invoking streaming model: {} ({} parts, aspect ratio {}, size {})",
            self.model(),
            parts.len(),
            config.aspect_ratio,
            config.image_size
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request error details: {:?}", e);
                GenerationError::ServiceError(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let marker = if status.as_u16() == 429 && !body.to_ascii_uppercase().contains("QUOTA")
            {
                " RATE_LIMIT"
            } else {
                ""
            };
            log::error!("Gemini returned {}: {}", status, body);
            return Err(GenerationError::ServiceError(format!(
                "Gemini request failed ({}{}): {}",
                status.as_u16(),
                marker,
                truncate_text(&body, MAX_ERROR_BODY_CHARS)
            )));
        }

        // Forward decoded chunks through a channel so the caller sees a plain stream.
        let (tx, rx) = mpsc::channel(32);
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            loop {
                let (events, finished) = match body.next().await {
                    Some(Ok(bytes)) => (decoder.push(&bytes), false),
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(GenerationError::ServiceError(format!(
                                "Stream interrupted: {}",
                                e
                            ))))
                            .await;
                        return;
                    }
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for data in events {
                    match parse_event(&data) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                if tx.send(Ok(chunk)).await.is_err() {
                                    log::debug!("Chunk receiver dropped; abandoning stream");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }

                if finished {
                    return;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
