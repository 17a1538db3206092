//! Patient identity collection.
//!
//! The intake form edits one field at a time. Each edit replaces that field in the held
//! [`PatientRecord`] and hands back the whole merged record. Nothing here enforces required
//! fields: gating happens only when an analysis is triggered.

use crate::{IntakeError, IntakeResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Patient gender as selected on the form.
///
/// `Unset` serialises as an empty string, matching an untouched `<select>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    #[serde(rename = "", alias = "unset")]
    Unset,
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unset" => Ok(Gender::Unset),
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(IntakeError::InvalidInput(format!(
                "gender must be one of male, female, other or empty, got '{}'",
                other
            ))),
        }
    }
}

/// Flat patient identity and history record.
///
/// Every value except `gender` is stored exactly as typed. Ages are not parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    pub name: String,
    /// Age in years, kept as the raw form string
    pub age: String,
    pub gender: Gender,
    pub phone: String,
    /// Village, district and state
    pub village: String,
    pub medical_history: String,
    pub current_medications: String,
    pub allergies: String,
}

impl PatientRecord {
    /// Returns true when name, age and gender have all been provided.
    ///
    /// This is a presence check only; an age of `"abc"` still counts.
    pub fn has_identity(&self) -> bool {
        !self.name.trim().is_empty() && !self.age.trim().is_empty() && self.gender != Gender::Unset
    }
}

/// Editable fields of a [`PatientRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PatientField {
    Name,
    Age,
    Gender,
    Phone,
    Village,
    MedicalHistory,
    CurrentMedications,
    Allergies,
}

impl FromStr for PatientField {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(PatientField::Name),
            "age" => Ok(PatientField::Age),
            "gender" => Ok(PatientField::Gender),
            "phone" => Ok(PatientField::Phone),
            "village" | "locality" => Ok(PatientField::Village),
            "medicalHistory" => Ok(PatientField::MedicalHistory),
            "currentMedications" => Ok(PatientField::CurrentMedications),
            "allergies" => Ok(PatientField::Allergies),
            other => Err(IntakeError::InvalidInput(format!(
                "unknown patient field '{}'",
                other
            ))),
        }
    }
}

/// Holds the patient record for one intake session.
#[derive(Clone, Debug, Default)]
pub struct PatientCollector {
    record: PatientRecord,
}

impl PatientCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    /// Replaces one field and returns the merged record.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidInput` only for an unrecognised gender value. The record
    /// is left unchanged in that case.
    pub fn set_field(&mut self, field: PatientField, value: String) -> IntakeResult<PatientRecord> {
        let record = &mut self.record;
        match field {
            PatientField::Name => record.name = value,
            PatientField::Age => record.age = value,
            PatientField::Gender => record.gender = value.parse()?,
            PatientField::Phone => record.phone = value,
            PatientField::Village => record.village = value,
            PatientField::MedicalHistory => record.medical_history = value,
            PatientField::CurrentMedications => record.current_medications = value,
            PatientField::Allergies => record.allergies = value,
        }

        Ok(self.record.clone())
    }
}
