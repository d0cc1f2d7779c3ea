use crate::{
    config::StorageConfig,
    error::{GenerationError, Result},
    storage::{
        detect_mime, resolve_within,
        traits::{OutputSink, ReferenceStore},
        ReferenceImage, ReferenceKind,
    },
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reference and output store backed by three local directories.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    char_refs_dir: PathBuf,
    layout_refs_dir: PathBuf,
    output_dir: PathBuf,
    output_url_prefix: String,
}

impl LocalFileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            char_refs_dir: config.char_refs_dir.clone(),
            layout_refs_dir: config.layout_refs_dir.clone(),
            output_dir: config.output_dir.clone(),
            output_url_prefix: config.output_url_prefix.clone(),
        }
    }

    pub fn base_dir(&self, kind: ReferenceKind) -> &Path {
        match kind {
            ReferenceKind::Character => &self.char_refs_dir,
            ReferenceKind::Layout => &self.layout_refs_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ReferenceStore for LocalFileStore {
    async fn load(&self, kind: ReferenceKind, identifier: &str) -> Result<ReferenceImage> {
        let path = resolve_within(self.base_dir(kind), identifier)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GenerationError::NotFound(format!(
                    "{} reference '{}'",
                    kind, identifier
                )))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(GenerationError::ValidationError(format!(
                "{} reference '{}' is not a file",
                kind, identifier
            )));
        }

        // Symlinks may still point outside the reference directory.
        let canonical = fs::canonicalize(&path).await?;
        let base = fs::canonicalize(self.base_dir(kind)).await?;
        if !canonical.starts_with(&base) {
            return Err(GenerationError::ValidationError(format!(
                "{} reference '{}' resolves outside its directory",
                kind, identifier
            )));
        }

        let bytes = fs::read(&path).await?;
        let mime_type = detect_mime(&path, &bytes);
        log::debug!(
            "Loaded {} reference '{}' ({} bytes, {})",
            kind,
            identifier,
            bytes.len(),
            mime_type
        );

        Ok(ReferenceImage { bytes, mime_type })
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<String>> {
        let dir = self.base_dir(kind);
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GenerationError::NotFound(format!(
                    "directory {}",
                    dir.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl OutputSink for LocalFileStore {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let path = resolve_within(&self.output_dir, file_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        log::info!("💾 Saved image to {} ({} bytes)", path.display(), bytes.len());

        Ok(format!("{}/{}", self.output_url_prefix, file_name))
    }
}
