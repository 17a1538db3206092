//! Intake Image Decoding
//!
//! This crate turns raw file selections from the intake form into previewable image payloads.
//!
//! ## Design Principles
//!
//! - Acceptance is decided by the *declared* media type only (`image/*`)
//! - Decoding never inspects or rejects content; the sniffed type is informational
//! - Payloads live in memory for the lifetime of an intake session and are never written out
//!
//! ## Decoded payload
//!
//! ```text
//! FileSelection (name, declared type, bytes)
//!     └── decode ──> ImagePayload
//!                     ├── data_url   "data:image/png;base64,iVBOR…"
//!                     ├── hash       sha256 hex digest
//!                     ├── size_bytes
//!                     └── detected_media_type (best effort)
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use intake_files::{decode, FileSelection};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let selection = FileSelection::from_path(Path::new("chest.png"))?;
//! if selection.is_image() {
//!     let payload = decode(selection)?;
//!     println!("{} bytes, sha256 {}", payload.size_bytes, payload.hash);
//! }
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::{DATA_URL_SCHEME, HASH_ALGORITHM};
pub use files::{decode, FileSelection, ImagePayload};

/// Errors that can occur while reading or decoding a file selection
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The selection has no usable filename
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// The declared media type could not be parsed
    #[error("Invalid media type: {0}")]
    InvalidMediaType(intake_types::TextError),

    /// A text field failed validation
    #[error("Invalid text: {0}")]
    Text(#[from] intake_types::TextError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
