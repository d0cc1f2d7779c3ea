pub mod client;
pub mod sse;
pub mod wire;

use crate::{
    error::Result,
    models::{ImageGenerationConfig, RequestPart, StreamChunk},
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

pub use client::GeminiClient;

/// Forward-only sequence of chunks from one generation call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submits the ordered parts and returns the response as it streams in.
    ///
    /// Dropping the returned stream abandons the call.
    async fn stream_generate(
        &self,
        parts: Vec<RequestPart>,
        config: &ImageGenerationConfig,
    ) -> Result<ChunkStream>;
}
