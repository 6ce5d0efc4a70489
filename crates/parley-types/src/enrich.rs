//! Attachment types for the context enrichers.
//!
//! An inbound message may carry an image (OCR) and/or a file (document
//! recognition). Both are passed to remote services as base64.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An uploaded file, base64-encoded, as sent to the recognition endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Base64 file bytes.
    pub buffer: String,
    pub name: String,
    pub mime: String,
}

/// Kind of content the recognizer found in an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Pdf,
    Table,
    Audio,
    Other,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Image => write!(f, "image"),
            ContentKind::Pdf => write!(f, "pdf"),
            ContentKind::Table => write!(f, "table"),
            ContentKind::Audio => write!(f, "audio"),
            ContentKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    /// Unknown kinds fall back to `Other` so new recognizer types degrade
    /// to the generic prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "image" => ContentKind::Image,
            "pdf" => ContentKind::Pdf,
            "table" => ContentKind::Table,
            "audio" => ContentKind::Audio,
            _ => ContentKind::Other,
        })
    }
}

/// Raw output of a recognizer, before the explanatory prefix is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub content: String,
    pub kind: ContentKind,
}

/// Errors from the enrichment services.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("{service} transport error: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} timed out after {secs}s")]
    Timeout { service: &'static str, secs: u64 },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} returned an invalid body: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_parses_known_and_unknown() {
        assert_eq!("pdf".parse::<ContentKind>().unwrap(), ContentKind::Pdf);
        assert_eq!("TABLE".parse::<ContentKind>().unwrap(), ContentKind::Table);
        assert_eq!("docx".parse::<ContentKind>().unwrap(), ContentKind::Other);
    }

    #[test]
    fn test_file_attachment_wire_shape() {
        let file = FileAttachment {
            buffer: "aGVsbG8=".to_string(),
            name: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["buffer"], "aGVsbG8=");
        assert_eq!(json["mime"], "text/plain");
    }
}
