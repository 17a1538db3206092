//! # API Shared
//!
//! Request and response bodies for the intake APIs.
//!
//! Contains:
//! - Wire types with OpenAPI schemas
//! - Conversions from request bodies into core [`IntakeUpdate`] messages
//! - Shared services like `HealthService`
//!
//! Enum-valued fields arrive as plain strings and are parsed here, so an unknown value surfaces
//! as `IntakeError::InvalidInput` rather than a body rejection.

pub mod health;

pub use health::HealthService;

use intake_core::{
    CommonSymptom, EntryId, ImageChange, ImageType, IntakeError, IntakeResult, IntakeUpdate,
    PatientField, SessionSummary, SymptomChange, SymptomSeverity, VitalField,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ListSessionsRes {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct CommonSymptomsRes {
    pub symptoms: Vec<CommonSymptom>,
}

/// One patient field edit, e.g. `{"field": "medicalHistory", "value": "Type 2 diabetes"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

impl UpdatePatientReq {
    pub fn into_update(self) -> IntakeResult<IntakeUpdate> {
        Ok(IntakeUpdate::Patient {
            field: self.field.parse::<PatientField>()?,
            value: self.value,
        })
    }
}

/// One vital sign edit, e.g. `{"field": "heartRate", "value": "88"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateVitalReq {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

impl UpdateVitalReq {
    pub fn into_update(self) -> IntakeResult<IntakeUpdate> {
        Ok(IntakeUpdate::Vital {
            field: self.field.parse::<VitalField>()?,
            value: self.value,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddSymptomReq {
    pub name: String,
}

impl AddSymptomReq {
    pub fn into_update(self) -> IntakeUpdate {
        IntakeUpdate::AddSymptom(self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateSymptomReq {
    pub severity: Option<String>,
    pub duration: Option<String>,
}

impl UpdateSymptomReq {
    /// Expands the request into one update per present field, severity first.
    ///
    /// Every field is validated before any update is produced.
    pub fn into_updates(self, id: EntryId) -> IntakeResult<Vec<IntakeUpdate>> {
        let mut changes = Vec::new();
        if let Some(severity) = self.severity {
            changes.push(SymptomChange::Severity(severity.parse::<SymptomSeverity>()?));
        }
        if let Some(duration) = self.duration {
            changes.push(SymptomChange::Duration(duration));
        }
        if changes.is_empty() {
            return Err(IntakeError::InvalidInput(
                "nothing to update: provide severity or duration".into(),
            ));
        }

        Ok(changes
            .into_iter()
            .map(|change| IntakeUpdate::UpdateSymptom { id, change })
            .collect())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateImageReq {
    #[serde(rename = "type")]
    pub image_type: Option<String>,
    pub description: Option<String>,
}

impl UpdateImageReq {
    /// Expands the request into one update per present field, type first.
    pub fn into_updates(self, id: EntryId) -> IntakeResult<Vec<IntakeUpdate>> {
        let mut changes = Vec::new();
        if let Some(image_type) = self.image_type {
            changes.push(ImageChange::Type(image_type.parse::<ImageType>()?));
        }
        if let Some(description) = self.description {
            changes.push(ImageChange::Description(description));
        }
        if changes.is_empty() {
            return Err(IntakeError::InvalidInput(
                "nothing to update: provide type or description".into(),
            ));
        }

        Ok(changes
            .into_iter()
            .map(|change| IntakeUpdate::UpdateImage { id, change })
            .collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReq {
    pub image_id: String,
}

impl PreviewReq {
    pub fn into_update(self) -> IntakeResult<IntakeUpdate> {
        Ok(IntakeUpdate::SetPreview(EntryId::parse(&self.image_id)?))
    }
}
