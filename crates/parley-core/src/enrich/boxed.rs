//! Object-safe wrappers for the recognizer traits.

use std::future::Future;
use std::pin::Pin;

use parley_types::enrich::{EnrichError, FileAttachment, Recognition};

use super::{FileRecognizer, ImageRecognizer};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EnrichError>> + Send + 'a>>;

pub trait ImageRecognizerDyn: Send + Sync {
    fn recognize_image_boxed<'a>(&'a self, image_base64: &'a str) -> BoxFuture<'a, String>;
}

impl<T: ImageRecognizer> ImageRecognizerDyn for T {
    fn recognize_image_boxed<'a>(&'a self, image_base64: &'a str) -> BoxFuture<'a, String> {
        Box::pin(self.recognize_image(image_base64))
    }
}

pub trait FileRecognizerDyn: Send + Sync {
    fn recognize_file_boxed<'a>(&'a self, file: &'a FileAttachment) -> BoxFuture<'a, Recognition>;
}

impl<T: FileRecognizer> FileRecognizerDyn for T {
    fn recognize_file_boxed<'a>(&'a self, file: &'a FileAttachment) -> BoxFuture<'a, Recognition> {
        Box::pin(self.recognize_file(file))
    }
}

/// Type-erased OCR client.
pub struct BoxImageRecognizer {
    inner: Box<dyn ImageRecognizerDyn + Send + Sync>,
}

impl BoxImageRecognizer {
    pub fn new<T: ImageRecognizer + 'static>(recognizer: T) -> Self {
        Self {
            inner: Box::new(recognizer),
        }
    }

    pub async fn recognize_image(&self, image_base64: &str) -> Result<String, EnrichError> {
        self.inner.recognize_image_boxed(image_base64).await
    }
}

/// Type-erased file recognition client.
pub struct BoxFileRecognizer {
    inner: Box<dyn FileRecognizerDyn + Send + Sync>,
}

impl BoxFileRecognizer {
    pub fn new<T: FileRecognizer + 'static>(recognizer: T) -> Self {
        Self {
            inner: Box::new(recognizer),
        }
    }

    pub async fn recognize_file(&self, file: &FileAttachment) -> Result<Recognition, EnrichError> {
        self.inner.recognize_file_boxed(file).await
    }
}
