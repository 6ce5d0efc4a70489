//! Attachment enrichment for one inbound message.

use std::time::Duration;

use parley_types::enrich::{ContentKind, EnrichError, FileAttachment};
use tracing::debug;

use super::boxed::{BoxFileRecognizer, BoxImageRecognizer};

/// Label placed before the user's own text once context is prepended.
const USER_REQUEST_LABEL: &str = "User request:";

/// Explanatory phrase placed before recognized content of each kind.
///
/// Audio has none: its content is already a transcript.
pub fn context_prefix(kind: ContentKind) -> Option<&'static str> {
    match kind {
        ContentKind::Image => Some("The user provided context as an image. Here is what it contains:"),
        ContentKind::Pdf => Some("The user provided context as a PDF document. Here is what it contains:"),
        ContentKind::Table => Some("The user provided context as a table. Here are its contents:"),
        ContentKind::Other => Some("The user provided context in a file. Here is what it contains:"),
        ContentKind::Audio => None,
    }
}

/// Apply the kind's prefix to recognized content.
pub fn with_context_prefix(kind: ContentKind, content: &str) -> String {
    match context_prefix(kind) {
        Some(prefix) => format!("{prefix}\n{content}"),
        None => content.to_string(),
    }
}

/// Context extracted from the attachments of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub image_context: Option<String>,
    pub file_context: Option<String>,
}

impl Enrichment {
    /// Number of attachments that produced context.
    pub fn count(&self) -> u32 {
        u32::from(self.image_context.is_some()) + u32::from(self.file_context.is_some())
    }

    /// Prepend image then file context to `prompt`.
    ///
    /// Without context the prompt is returned unchanged.
    pub fn compose(&self, prompt: &str) -> String {
        if self.count() == 0 {
            return prompt.to_string();
        }
        let mut parts: Vec<String> = Vec::with_capacity(3);
        parts.extend(self.image_context.iter().cloned());
        parts.extend(self.file_context.iter().cloned());
        parts.push(format!("{USER_REQUEST_LABEL} {prompt}"));
        parts.join("\n\n")
    }
}

/// Runs the OCR and file recognizers for a message.
///
/// The two calls are independent and run concurrently, each under its own
/// timeout. Any failure fails the whole enrichment.
pub struct ContextEnricher {
    images: BoxImageRecognizer,
    files: BoxFileRecognizer,
    timeout: Duration,
}

impl ContextEnricher {
    pub fn new(images: BoxImageRecognizer, files: BoxFileRecognizer, timeout: Duration) -> Self {
        Self {
            images,
            files,
            timeout,
        }
    }

    pub async fn enrich(
        &self,
        image: Option<&str>,
        file: Option<&FileAttachment>,
    ) -> Result<Enrichment, EnrichError> {
        let image_task = async {
            match image {
                Some(image) => {
                    let text = self
                        .bounded("ocr", self.images.recognize_image(image))
                        .await?;
                    debug!(chars = text.len(), "image recognized");
                    Ok(Some(with_context_prefix(ContentKind::Image, &text)))
                }
                None => Ok(None),
            }
        };
        let file_task = async {
            match file {
                Some(file) => {
                    let recognition = self
                        .bounded("file recognition", self.files.recognize_file(file))
                        .await?;
                    debug!(kind = %recognition.kind, file = %file.name, "file recognized");
                    Ok(Some(with_context_prefix(recognition.kind, &recognition.content)))
                }
                None => Ok(None),
            }
        };

        let (image_context, file_context) = tokio::try_join!(image_task, file_task)?;
        Ok(Enrichment {
            image_context,
            file_context,
        })
    }

    async fn bounded<T>(
        &self,
        service: &'static str,
        call: impl std::future::Future<Output = Result<T, EnrichError>>,
    ) -> Result<T, EnrichError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| EnrichError::Timeout {
                service,
                secs: self.timeout.as_secs(),
            })?
    }
}
