use crate::{
    error::Result,
    models::{Character, RequestPart},
    storage::{validate_identifier, ReferenceKind, ReferenceStore},
};

/// A reference the caller asked for that had no file behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedReference {
    pub kind: ReferenceKind,
    pub identifier: String,
}

impl SkippedReference {
    pub fn warning(&self) -> String {
        format!(
            "{} reference image '{}' was not found and was not attached",
            self.kind, self.identifier
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssembledRequest {
    pub parts: Vec<RequestPart>,
    pub skipped: Vec<SkippedReference>,
}

impl AssembledRequest {
    pub fn warnings(&self) -> Vec<String> {
        self.skipped.iter().map(SkippedReference::warning).collect()
    }
}

/// Orders the request as: prompt, layout reference, character references.
///
/// Missing reference files are skipped and recorded; any other failure,
/// including a rejected identifier, aborts assembly.
pub async fn assemble(
    prompt_text: String,
    layout_reference_id: Option<&str>,
    characters: &[Character],
    store: &dyn ReferenceStore,
) -> Result<AssembledRequest> {
    let mut assembled = AssembledRequest {
        parts: vec![RequestPart::Text(prompt_text)],
        skipped: Vec::new(),
    };

    let references: Vec<(ReferenceKind, &str)> = layout_reference_id
        .map(|id| (ReferenceKind::Layout, id))
        .into_iter()
        .chain(
            characters
                .iter()
                .filter_map(|c| c.reference_identifier())
                .map(|id| (ReferenceKind::Character, id)),
        )
        .collect();

    // Nothing is read until every identifier has passed.
    for (_, identifier) in &references {
        validate_identifier(identifier)?;
    }

    for (kind, identifier) in references {
        match store.load(kind, identifier).await {
            Ok(image) => assembled.parts.push(RequestPart::Image {
                mime_type: image.mime_type,
                data: image.bytes,
            }),
            Err(e) if e.is_not_found() => {
                log::warn!("⚠️  Skipping missing {} reference '{}'", kind, identifier);
                assembled.skipped.push(SkippedReference {
                    kind,
                    identifier: identifier.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "Assembled {} request parts ({} references skipped)",
        assembled.parts.len(),
        assembled.skipped.len()
    );
    Ok(assembled)
}
