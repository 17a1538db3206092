//! File selection reading and payload decoding
//!
//! A [`FileSelection`] is what the browser hands over when a clinician picks files: a name, a
//! declared media type and the raw bytes. [`decode`] produces an [`ImagePayload`] carrying a
//! `data:` URL suitable for an `<img src>` preview, the way a browser `FileReader` would, plus
//! audit metadata (size, SHA-256 digest, sniffed type).
//!
//! # Implementation Notes
//!
//! - Decoding is CPU-bound (hashing and base64). Callers running on an async runtime should
//!   move it onto a blocking task.
//! - Reading from disk is only used by the command-line runner. The server receives bytes
//!   from multipart uploads.

use crate::{FilesError, DATA_URL_SCHEME, HASH_ALGORITHM};
use base64::Engine;
use chrono::{DateTime, Utc};
use intake_types::{MediaType, NonEmptyText};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Filename used when the client sends an upload without one.
const FALLBACK_FILENAME: &str = "upload";

/// A single file picked by the user, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    /// Name reported by the client
    pub filename: String,

    /// Media type declared by the client (not verified against content)
    pub media_type: String,

    /// Raw file content
    pub bytes: Vec<u8>,
}

impl FileSelection {
    /// Creates a selection from parts received over the wire.
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a selection from disk, declaring the media type from the file extension.
    ///
    /// The declared type mirrors what a browser file picker reports: it comes from the
    /// extension alone, so a `.png` containing text is still declared `image/png`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the file cannot be read and
    /// `FilesError::InvalidFilename` if the path has no final component.
    pub fn from_path(path: &Path) -> Result<Self, FilesError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FilesError::InvalidFilename(path.display().to_string()))?
            .to_string();

        let bytes = fs::read(path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;

        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            filename,
            media_type,
            bytes,
        })
    }

    /// Returns true when the declared media type begins with `image/`, exactly as sent.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// A decoded, previewable image payload.
///
/// The raw bytes are kept for the lifetime of the session but never serialised; clients only
/// ever see the `data_url`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Original filename from the selection
    pub original_filename: NonEmptyText,

    /// Media type declared by the client
    pub declared_media_type: MediaType,

    /// Media type sniffed from the content, if recognisable
    ///
    /// Best-effort only. It is never used to accept or reject an upload.
    pub detected_media_type: Option<NonEmptyText>,

    /// Size of the payload in bytes
    pub size_bytes: u64,

    /// Digest algorithm (always "sha256")
    pub hash_algorithm: NonEmptyText,

    /// Hexadecimal digest of the content
    pub hash: String,

    /// `data:<mime>;base64,<content>` preview reference
    pub data_url: String,

    /// UTC timestamp when decoding finished
    pub decoded_at: DateTime<Utc>,

    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Decodes a file selection into a previewable payload.
///
/// # Errors
///
/// Returns `FilesError::InvalidMediaType` if the declared media type is malformed. Callers
/// filter to `image/*` selections before decoding; this function does not re-check that.
pub fn decode(selection: FileSelection) -> Result<ImagePayload, FilesError> {
    let declared_media_type =
        MediaType::parse(&selection.media_type).map_err(FilesError::InvalidMediaType)?;

    let original_filename = NonEmptyText::new(&selection.filename)
        .or_else(|_| NonEmptyText::new(FALLBACK_FILENAME))?;

    let mut hasher = Sha256::new();
    hasher.update(&selection.bytes);
    let hash = hex::encode(hasher.finalize());

    let detected_media_type = infer::get(&selection.bytes)
        .and_then(|kind| NonEmptyText::new(kind.mime_type()).ok());

    let encoded = base64::engine::general_purpose::STANDARD.encode(&selection.bytes);
    let data_url = format!(
        "{}{};base64,{}",
        DATA_URL_SCHEME,
        declared_media_type.as_str(),
        encoded
    );

    Ok(ImagePayload {
        original_filename,
        declared_media_type,
        detected_media_type,
        size_bytes: selection.bytes.len() as u64,
        hash_algorithm: NonEmptyText::new(HASH_ALGORITHM)?,
        hash,
        data_url,
        decoded_at: Utc::now(),
        bytes: selection.bytes,
    })
}
