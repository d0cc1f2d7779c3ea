use crate::{
    error::Result,
    models::{GenerationResult, StreamChunk},
    storage::{extension_for_mime, OutputSink},
};
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Output file names for one generation call.
///
/// Names combine the call's start time, a random per-call token and an index
/// that increases with every image, so concurrent calls never collide.
#[derive(Debug)]
pub struct OutputNamer {
    stamp: String,
    token: String,
    index: AtomicUsize,
}

impl OutputNamer {
    pub fn new() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self {
            stamp: Utc::now().format("%Y%m%d_%H%M%S%3f").to_string(),
            token: token[..8].to_string(),
            index: AtomicUsize::new(0),
        }
    }

    pub fn next_name(&self, mime_type: &str) -> String {
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        format!(
            "manga_{}_{}_{:02}.{}",
            self.stamp,
            self.token,
            index,
            extension_for_mime(mime_type)
        )
    }
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains `chunks` in order, persisting images and concatenating text.
///
/// The last image written becomes the result image. A stream error aborts the
/// call; files already written are left in place.
pub async fn consume<S>(mut chunks: S, sink: &dyn OutputSink) -> Result<GenerationResult>
where
    S: Stream<Item = Result<StreamChunk>> + Unpin,
{
    let namer = OutputNamer::new();
    let mut thought_process = String::new();
    let mut image_url = None;
    let mut received = 0usize;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        received += 1;
        if chunk.is_empty() {
            log::trace!("Skipping empty chunk #{}", received);
            continue;
        }

        match chunk {
            StreamChunk::Text(fragment) => thought_process.push_str(&fragment),
            StreamChunk::Image { mime_type, data } => {
                let file_name = namer.next_name(&mime_type);
                let url = sink.write(&file_name, &data).await?;
                log::debug!("Image chunk #{} stored as {}", received, url);
                image_url = Some(url);
            }
            StreamChunk::Empty => {}
        }
    }

    log::info!(
        "Stream finished after {} chunks ({} chars of text, image: {})",
        received,
        thought_process.len(),
        image_url.as_deref().unwrap_or("none")
    );
    Ok(GenerationResult::success(thought_process, image_url))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;

    /// Keeps written blobs in memory, in write order.
    #[derive(Default)]
    pub(crate) struct MemorySink {
        pub(crate) written: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl OutputSink for MemorySink {
        async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
            self.written
                .lock()
                .unwrap()
                .push((file_name.to_string(), bytes.to_vec()));
            Ok(format!("/out/{}", file_name))
        }
    }

    fn ok_stream(chunks: Vec<StreamChunk>) -> impl Stream<Item = Result<StreamChunk>> + Unpin {
        stream::iter(chunks.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_text_accumulates_and_last_image_wins() {
        let sink = MemorySink::default();
        let chunks = vec![
            StreamChunk::text("a"),
            StreamChunk::image("image/png", b"X".to_vec()),
            StreamChunk::text("b"),
            StreamChunk::image("image/jpeg", b"Y".to_vec()),
        ];

        let result = consume(ok_stream(chunks), &sink).await.unwrap();
        assert!(result.success);
        assert_eq!(result.thought_process, "ab");

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_ne!(written[0].0, written[1].0);
        assert!(written[1].0.ends_with("_01.jpg"));
        assert_eq!(written[1].1, b"Y");
        assert_eq!(result.image_url, Some(format!("/out/{}", written[1].0)));
    }

    #[tokio::test]
    async fn test_empty_chunks_are_skipped() {
        let sink = MemorySink::default();
        let chunks = vec![
            StreamChunk::Empty,
            StreamChunk::text(""),
            StreamChunk::image("image/png", Vec::new()),
            StreamChunk::text("only text"),
        ];

        let result = consume(ok_stream(chunks), &sink).await.unwrap();
        assert!(result.success);
        assert_eq!(result.thought_process, "only text");
        assert!(result.image_url.is_none());
        assert!(sink.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_stream_is_success_without_image() {
        let sink = MemorySink::default();
        let result = consume(ok_stream(Vec::new()), &sink).await.unwrap();
        assert!(result.success);
        assert!(result.thought_process.is_empty());
        assert!(result.image_url.is_none());
    }

    #[tokio::test]
    async fn test_stream_error_aborts_but_keeps_files() {
        let sink = MemorySink::default();
        let chunks: Vec<Result<StreamChunk>> = vec![
            Ok(StreamChunk::image("image/png", b"draft".to_vec())),
            Err(GenerationError::ServiceError("connection reset".into())),
            Ok(StreamChunk::text("never seen")),
        ];

        let err = consume(stream::iter(chunks), &sink).await.unwrap_err();
        assert!(matches!(err, GenerationError::ServiceError(_)));
        assert_eq!(sink.written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_namer_is_unique_per_call_and_index() {
        let first = OutputNamer::new();
        let second = OutputNamer::new();
        let a = first.next_name("image/png");
        let b = first.next_name("image/png");
        let c = second.next_name("image/png");
        assert!(a.starts_with("manga_") && a.ends_with("_00.png"));
        assert!(b.ends_with("_01.png"));
        assert_ne!(a, c);
    }
}
