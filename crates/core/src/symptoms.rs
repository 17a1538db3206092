//! Vital signs and symptom collection.
//!
//! Symptoms form an ordered list; vitals are a single record of raw strings. Every mutation
//! returns the combined [`SymptomSnapshot`] so callers always see both halves together.

use crate::constants::COMMON_SYMPTOMS;
use crate::{IntakeError, IntakeResult};
use intake_types::NonEmptyText;
use intake_uuid::EntryId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SymptomSeverity {
    #[default]
    Mild,
    Moderate,
    Severe,
}

impl FromStr for SymptomSeverity {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(SymptomSeverity::Mild),
            "moderate" => Ok(SymptomSeverity::Moderate),
            "severe" => Ok(SymptomSeverity::Severe),
            other => Err(IntakeError::InvalidInput(format!(
                "severity must be mild, moderate or severe, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    #[schema(value_type = String)]
    pub id: EntryId,
    pub name: String,
    pub severity: SymptomSeverity,
    /// Free text such as "3 days"
    pub duration: String,
}

/// A single edit to an existing symptom entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymptomChange {
    Severity(SymptomSeverity),
    Duration(String),
}

/// Vital signs as typed. No value is parsed or range checked when stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    /// Degrees Fahrenheit
    pub temperature: String,
    /// "systolic/diastolic"
    pub blood_pressure: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    /// Percent
    pub oxygen_saturation: String,
}

impl VitalSigns {
    /// Temperature read the way a browser `parseFloat` reads it.
    ///
    /// Returns `None` when the text does not start with a number or `Infinity`.
    pub fn temperature_value(&self) -> Option<f64> {
        parse_leading_number(&self.temperature)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum VitalField {
    Temperature,
    BloodPressure,
    HeartRate,
    RespiratoryRate,
    OxygenSaturation,
}

impl FromStr for VitalField {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(VitalField::Temperature),
            "bloodPressure" => Ok(VitalField::BloodPressure),
            "heartRate" => Ok(VitalField::HeartRate),
            "respiratoryRate" => Ok(VitalField::RespiratoryRate),
            "oxygenSaturation" => Ok(VitalField::OxygenSaturation),
            other => Err(IntakeError::InvalidInput(format!(
                "unknown vital sign '{}'",
                other
            ))),
        }
    }
}

/// Combined symptom list and vitals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymptomSnapshot {
    pub symptoms: Vec<SymptomEntry>,
    pub vitals: VitalSigns,
}

/// Entry in the quick-add list, flagged when already present in the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonSymptom {
    pub name: String,
    pub added: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SymptomCollector {
    symptoms: Vec<SymptomEntry>,
    vitals: VitalSigns,
}

impl SymptomCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symptoms(&self) -> &[SymptomEntry] {
        &self.symptoms
    }

    pub fn vitals(&self) -> &VitalSigns {
        &self.vitals
    }

    pub fn snapshot(&self) -> SymptomSnapshot {
        SymptomSnapshot {
            symptoms: self.symptoms.clone(),
            vitals: self.vitals.clone(),
        }
    }

    /// Returns true if an entry with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.symptoms.iter().any(|s| s.name == name)
    }

    /// Appends a symptom with `mild` severity and no duration.
    ///
    /// The name is trimmed first. Adding a name that is already listed is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Text` if the name is blank.
    pub fn add_symptom(&mut self, name: &str) -> IntakeResult<SymptomSnapshot> {
        let name = NonEmptyText::new(name)?;

        if self.contains(name.as_str()) {
            tracing::debug!("symptom '{}' already listed", name);
            return Ok(self.snapshot());
        }

        self.symptoms.push(SymptomEntry {
            id: EntryId::new(),
            name: name.into_inner(),
            severity: SymptomSeverity::default(),
            duration: String::new(),
        });

        Ok(self.snapshot())
    }

    /// # Errors
    ///
    /// Returns `IntakeError::SymptomNotFound` for an unknown id.
    pub fn update_symptom(
        &mut self,
        id: EntryId,
        change: SymptomChange,
    ) -> IntakeResult<SymptomSnapshot> {
        let entry = self
            .symptoms
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(IntakeError::SymptomNotFound(id))?;

        match change {
            SymptomChange::Severity(severity) => entry.severity = severity,
            SymptomChange::Duration(duration) => entry.duration = duration,
        }

        Ok(self.snapshot())
    }

    /// # Errors
    ///
    /// Returns `IntakeError::SymptomNotFound` for an unknown id.
    pub fn remove_symptom(&mut self, id: EntryId) -> IntakeResult<SymptomSnapshot> {
        let before = self.symptoms.len();
        self.symptoms.retain(|s| s.id != id);
        if self.symptoms.len() == before {
            return Err(IntakeError::SymptomNotFound(id));
        }

        Ok(self.snapshot())
    }

    pub fn set_vital(&mut self, field: VitalField, value: String) -> SymptomSnapshot {
        let vitals = &mut self.vitals;
        match field {
            VitalField::Temperature => vitals.temperature = value,
            VitalField::BloodPressure => vitals.blood_pressure = value,
            VitalField::HeartRate => vitals.heart_rate = value,
            VitalField::RespiratoryRate => vitals.respiratory_rate = value,
            VitalField::OxygenSaturation => vitals.oxygen_saturation = value,
        }

        self.snapshot()
    }

    pub fn common_symptoms(&self) -> Vec<CommonSymptom> {
        COMMON_SYMPTOMS
            .iter()
            .map(|name| CommonSymptom {
                name: (*name).to_string(),
                added: self.contains(name),
            })
            .collect()
    }
}

/// Reads the longest numeric prefix of `input`, ignoring leading whitespace.
///
/// `"104.5F"` reads as `104.5`, `"  99"` as `99.0`, and `"high"` as `None`. An exponent is
/// only consumed when at least one digit follows it. A leading `Infinity`, optionally signed,
/// reads as an infinite value.
pub fn parse_leading_number(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}
