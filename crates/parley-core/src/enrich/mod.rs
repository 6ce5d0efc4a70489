//! Context enrichers: turn attachments into textual prompt context.
//!
//! - `ImageRecognizer` / `FileRecognizer`: RPITIT ports to the remote
//!   OCR and document recognition services
//! - `BoxImageRecognizer` / `BoxFileRecognizer`: dynamic dispatch wrappers
//! - `ContextEnricher`: runs both under a timeout and prefixes their output

pub mod boxed;
pub mod context;

use parley_types::enrich::{EnrichError, FileAttachment, Recognition};

/// OCR over a base64-encoded image.
pub trait ImageRecognizer: Send + Sync {
    /// Returns the raw transcription, without any explanatory prefix.
    fn recognize_image(
        &self,
        image_base64: &str,
    ) -> impl std::future::Future<Output = Result<String, EnrichError>> + Send;
}

/// Content extraction for an uploaded document.
pub trait FileRecognizer: Send + Sync {
    fn recognize_file(
        &self,
        file: &FileAttachment,
    ) -> impl std::future::Future<Output = Result<Recognition, EnrichError>> + Send;
}
