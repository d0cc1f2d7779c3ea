use crate::{
    error::Result,
    storage::{ReferenceImage, ReferenceKind},
};
use async_trait::async_trait;

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Fails with `NotFound` when the identifier resolves to no file, and with
    /// `ValidationError` when it would leave the kind's base directory.
    async fn load(&self, kind: ReferenceKind, identifier: &str) -> Result<ReferenceImage>;

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<String>>;
}

#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Writes `bytes` under `file_name` and returns its external reference.
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}
