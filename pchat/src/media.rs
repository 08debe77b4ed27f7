//! Binary question content normalization ahead of the model call.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pprovider::{ContentItem, ContentKind, ModelCapabilities};

use crate::{ChatError, ChatFuture};

pub trait MediaPreprocessor: Send + Sync {
    /// Rewrites raw `FileBytes` items into forms the target model accepts.
    fn normalize<'a>(
        &'a self,
        items: &'a mut Vec<ContentItem>,
        capabilities: ModelCapabilities,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

/// Inlines images, and audio for models that accept it, as base64 items.
/// Other bytes are left as files; transcription and compression need a
/// dedicated preprocessor.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineMediaPreprocessor;

impl MediaPreprocessor for InlineMediaPreprocessor {
    fn normalize<'a>(
        &'a self,
        items: &'a mut Vec<ContentItem>,
        capabilities: ModelCapabilities,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            for item in items.iter_mut() {
                if item.kind != ContentKind::FileBytes {
                    continue;
                }
                let kind = if item.mime_starts_with("image") {
                    ContentKind::ImageBase64
                } else if item.mime_starts_with("audio") && capabilities.audio {
                    ContentKind::AudioBase64
                } else {
                    continue;
                };

                if let Some(bytes) = item.bytes.take() {
                    item.content = BASE64.encode(&bytes);
                    item.kind = kind;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn images_inline_and_audio_depends_on_model() {
        let mut items = vec![
            ContentItem::file_bytes(b"foo".to_vec(), "a.png", "image/png"),
            ContentItem::file_bytes(b"fo".to_vec(), "b.mp3", "audio/mpeg"),
            ContentItem::file_bytes(b"f".to_vec(), "c.pdf", "application/pdf"),
        ];
        let mut with_audio = items.clone();

        InlineMediaPreprocessor
            .normalize(&mut items, ModelCapabilities::text_only())
            .await
            .expect("normalize");
        assert_eq!(items[0].kind, ContentKind::ImageBase64);
        assert_eq!(items[0].content, "Zm9v");
        assert!(items[0].bytes.is_none());
        assert_eq!(items[1].kind, ContentKind::FileBytes);
        assert_eq!(items[2].kind, ContentKind::FileBytes);

        InlineMediaPreprocessor
            .normalize(&mut with_audio, ModelCapabilities::text_only().with_audio())
            .await
            .expect("normalize");
        assert_eq!(with_audio[1].kind, ContentKind::AudioBase64);
        assert_eq!(with_audio[1].content, "Zm8=");
        assert_eq!(with_audio[1].mime_type.as_deref(), Some("audio/mpeg"));
    }
}
