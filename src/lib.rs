//! Four-panel manga generation pipeline.
//!
//! Builds a structured prompt from characters and scenes, attaches reference
//! images, streams the request through Gemini and splits the response into
//! the model's thought process and the persisted output image.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{Config, GeminiConfig, ServerConfig, StorageConfig};
pub use error::{GenerationError, Result};
pub use gemini::{ChunkStream, GeminiClient, GenerationService};
pub use models::*;
pub use pipeline::{build_prompt, GenerationMode, MangaGenerator};
pub use storage::{LocalFileStore, OutputSink, ReferenceKind, ReferenceStore};
