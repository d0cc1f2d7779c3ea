use crate::{
    error::{GenerationError, Result},
    gemini::GenerationService,
    logger,
    models::{AspectRatio, GenerationRequest, GenerationResult, ImageGenerationConfig, RequestPart},
    pipeline::{assembler, demux, prompt},
    storage::{OutputSink, ReferenceStore},
};
use std::sync::Arc;

/// How the request content for one call is built.
#[derive(Debug, Clone)]
pub enum GenerationMode {
    Fresh(GenerationRequest),
    /// Rebuilds prompt and references from the same structured inputs.
    FullRetry(GenerationRequest),
    /// Resubmits a captured thought process as the only request part.
    ImageOnly {
        thought_process: String,
        aspect_ratio: AspectRatio,
    },
}

impl GenerationMode {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationMode::Fresh(_) => "fresh",
            GenerationMode::FullRetry(_) => "full-retry",
            GenerationMode::ImageOnly { .. } => "image-only",
        }
    }
}

/// Runs one generation call end to end. Holds no per-call state.
#[derive(Clone)]
pub struct MangaGenerator {
    service: Arc<dyn GenerationService>,
    references: Arc<dyn ReferenceStore>,
    sink: Arc<dyn OutputSink>,
    image_size: String,
}

impl MangaGenerator {
    pub fn new(
        service: Arc<dyn GenerationService>,
        references: Arc<dyn ReferenceStore>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            service,
            references,
            sink,
            image_size: "2K".to_string(),
        }
    }

    pub fn with_image_size(mut self, image_size: impl Into<String>) -> Self {
        self.image_size = image_size.into();
        self
    }

    /// Never fails: every error is folded into a failed result.
    pub async fn run(&self, mode: GenerationMode) -> GenerationResult {
        let mode_name = mode.name();
        let _timer = logger::timer(&format!("{} generation", mode_name));

        match self.try_run(mode).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("❌ {} generation failed: {}", mode_name, e);
                GenerationResult::failure(&e)
            }
        }
    }

    pub async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        self.run(GenerationMode::Fresh(request)).await
    }

    pub async fn retry_full(&self, request: GenerationRequest) -> GenerationResult {
        self.run(GenerationMode::FullRetry(request)).await
    }

    pub async fn retry_image_only(
        &self,
        thought_process: String,
        aspect_ratio: AspectRatio,
    ) -> GenerationResult {
        self.run(GenerationMode::ImageOnly {
            thought_process,
            aspect_ratio,
        })
        .await
    }

    async fn try_run(&self, mode: GenerationMode) -> Result<GenerationResult> {
        let (parts, aspect_ratio, warnings) = match mode {
            GenerationMode::Fresh(request) | GenerationMode::FullRetry(request) => {
                let request = request.validated()?;
                let prompt_text = prompt::build_prompt(
                    &request.characters,
                    &request.scenes,
                    request.has_layout_reference(),
                );
                log::debug!("Built prompt ({} chars)", prompt_text.len());

                let assembled = assembler::assemble(
                    prompt_text,
                    request.layout_identifier(),
                    &request.characters,
                    self.references.as_ref(),
                )
                .await?;
                let warnings = assembled.warnings();
                (assembled.parts, request.aspect_ratio, warnings)
            }
            GenerationMode::ImageOnly {
                thought_process,
                aspect_ratio,
            } => {
                if thought_process.trim().is_empty() {
                    return Err(GenerationError::ValidationError(
                        "thought_process must not be empty for image-only regeneration".into(),
                    ));
                }
                (vec![RequestPart::Text(thought_process)], aspect_ratio, Vec::new())
            }
        };

        let config = ImageGenerationConfig {
            aspect_ratio,
            image_size: self.image_size.clone(),
        };
        let chunks = self.service.stream_generate(parts, &config).await?;
        let result = demux::consume(chunks, self.sink.as_ref()).await?;

        Ok(result.with_warnings(warnings))
    }
}
