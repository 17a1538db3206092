//! Uploaded image collection.
//!
//! A batch of file selections is filtered to declared `image/*` types and each accepted file
//! is decoded on its own blocking task. Images join the list as their decode finishes, so a
//! small file picked last can land before a large file picked first.
//!
//! Decoding is independent of the collector: [`PendingDecodes`] runs a batch without holding
//! any session state, and each finished payload is handed to
//! [`ImageCollector::push_decoded`].

use crate::{IntakeError, IntakeResult};
use intake_files::{FileSelection, FilesError, ImagePayload};
use intake_uuid::EntryId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::task::JoinSet;
use utoipa::ToSchema;

/// Clinical type tag chosen for an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Clinical photo
    #[default]
    Photo,
    #[serde(alias = "x-ray")]
    Xray,
    Ultrasound,
    /// CT/MRI scan
    Scan,
}

impl FromStr for ImageType {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(ImageType::Photo),
            "xray" | "x-ray" => Ok(ImageType::Xray),
            "ultrasound" => Ok(ImageType::Ultrasound),
            "scan" => Ok(ImageType::Scan),
            other => Err(IntakeError::InvalidInput(format!(
                "image type must be photo, xray, ultrasound or scan, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalImage {
    #[schema(value_type = String)]
    pub id: EntryId,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub description: String,
    #[schema(value_type = Object)]
    pub payload: ImagePayload,
}

impl MedicalImage {
    fn from_payload(payload: ImagePayload) -> Self {
        Self {
            id: EntryId::new(),
            image_type: ImageType::default(),
            description: String::new(),
            payload,
        }
    }

    /// Preview reference (`data:` URL).
    pub fn url(&self) -> &str {
        &self.payload.data_url
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageChange {
    Type(ImageType),
    Description(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSnapshot {
    pub images: Vec<MedicalImage>,
    /// Image currently shown full-screen
    #[schema(value_type = Option<String>)]
    pub preview: Option<EntryId>,
}

/// Decodes for one upload batch, running on blocking tasks.
#[derive(Debug, Default)]
pub struct PendingDecodes {
    tasks: JoinSet<Result<ImagePayload, FilesError>>,
}

impl PendingDecodes {
    /// Starts decoding every `image/*` selection in `batch`. Other selections are skipped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(batch: Vec<FileSelection>) -> Self {
        let mut tasks = JoinSet::new();
        for selection in batch {
            if !selection.is_image() {
                tracing::debug!(
                    "skipping non-image upload '{}' ({})",
                    selection.filename,
                    selection.media_type
                );
                continue;
            }
            tasks.spawn_blocking(move || intake_files::decode(selection));
        }
        Self { tasks }
    }

    /// Decodes still outstanding.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The next payload to finish, or `None` once the batch is drained.
    ///
    /// Failed decodes are logged and skipped.
    pub async fn next(&mut self) -> Option<ImagePayload> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(payload)) => return Some(payload),
                Ok(Err(e)) => tracing::warn!("failed to decode upload: {}", e),
                Err(e) => tracing::warn!("image decode task failed: {}", e),
            }
        }
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImageCollector {
    images: Vec<MedicalImage>,
    preview: Option<EntryId>,
}

impl ImageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[MedicalImage] {
        &self.images
    }

    pub fn snapshot(&self) -> ImageSnapshot {
        ImageSnapshot {
            images: self.images.clone(),
            preview: self.preview,
        }
    }

    /// Appends a decoded payload as a new photo with no description.
    pub fn push_decoded(&mut self, payload: ImagePayload) -> EntryId {
        let image = MedicalImage::from_payload(payload);
        let id = image.id;
        self.images.push(image);
        id
    }

    /// Decodes and appends every `image/*` selection in `batch`.
    ///
    /// Returns the ids of the images added, in the order their decodes completed.
    pub async fn add_files(&mut self, batch: Vec<FileSelection>) -> Vec<EntryId> {
        let mut decodes = PendingDecodes::spawn(batch);
        let mut added = Vec::new();
        while let Some(payload) = decodes.next().await {
            added.push(self.push_decoded(payload));
        }
        added
    }

    /// # Errors
    ///
    /// Returns `IntakeError::ImageNotFound` for an unknown id.
    pub fn update_image(&mut self, id: EntryId, change: ImageChange) -> IntakeResult<ImageSnapshot> {
        let image = self
            .images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(IntakeError::ImageNotFound(id))?;

        match change {
            ImageChange::Type(image_type) => image.image_type = image_type,
            ImageChange::Description(description) => image.description = description,
        }

        Ok(self.snapshot())
    }

    /// Removes an image, clearing the preview if it pointed at it.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::ImageNotFound` for an unknown id.
    pub fn remove_image(&mut self, id: EntryId) -> IntakeResult<ImageSnapshot> {
        let before = self.images.len();
        self.images.retain(|i| i.id != id);
        if self.images.len() == before {
            return Err(IntakeError::ImageNotFound(id));
        }

        if self.preview == Some(id) {
            self.preview = None;
        }

        Ok(self.snapshot())
    }

    /// # Errors
    ///
    /// Returns `IntakeError::ImageNotFound` for an unknown id.
    pub fn set_preview(&mut self, id: EntryId) -> IntakeResult<ImageSnapshot> {
        if !self.images.iter().any(|i| i.id == id) {
            return Err(IntakeError::ImageNotFound(id));
        }
        self.preview = Some(id);
        Ok(self.snapshot())
    }

    pub fn clear_preview(&mut self) -> ImageSnapshot {
        self.preview = None;
        self.snapshot()
    }

    /// The image currently previewed, if any.
    pub fn preview(&self) -> Option<&MedicalImage> {
        let id = self.preview?;
        self.images.iter().find(|i| i.id == id)
    }
}
