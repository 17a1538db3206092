//! Candidate diagnosis records.
//!
//! There is no inference engine behind the intake form. A completed analysis always yields the
//! same three pre-authored records from [`reference_diagnoses`], whatever was entered.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiagnosisSeverity {
    /// Display label, e.g. "Medium Priority".
    pub fn label(self) -> &'static str {
        match self {
            DiagnosisSeverity::Low => "Low Priority",
            DiagnosisSeverity::Medium => "Medium Priority",
            DiagnosisSeverity::High => "High Priority",
            DiagnosisSeverity::Critical => "Critical Priority",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub condition: String,
    /// Percentage, 0 to 100
    pub probability: u8,
    pub severity: DiagnosisSeverity,
    pub reasoning: String,
    pub recommended_tests: Vec<String>,
    pub referral_needed: bool,
    pub treatment_options: Vec<String>,
}

impl DiagnosisRecord {
    pub fn is_critical(&self) -> bool {
        self.severity == DiagnosisSeverity::Critical
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// The fixed result set returned by every completed analysis run.
pub fn reference_diagnoses() -> Vec<DiagnosisRecord> {
    vec![
        DiagnosisRecord {
            condition: "Acute Respiratory Infection".into(),
            probability: 85,
            severity: DiagnosisSeverity::Medium,
            reasoning: "Patient presents with fever (101.2°F), productive cough, and elevated \
                        respiratory rate. Combination of symptoms and vital signs strongly \
                        suggest respiratory tract infection, possibly bacterial given the \
                        severity."
                .into(),
            recommended_tests: strings(&[
                "Complete Blood Count (CBC)",
                "Chest X-ray",
                "Sputum culture if available",
                "Pulse oximetry monitoring",
            ]),
            referral_needed: false,
            treatment_options: strings(&[
                "Empirical antibiotic therapy (Amoxicillin 500mg TID)",
                "Supportive care with adequate hydration",
                "Paracetamol for fever management",
                "Monitor for complications",
            ]),
        },
        DiagnosisRecord {
            condition: "Viral Upper Respiratory Tract Infection".into(),
            probability: 65,
            severity: DiagnosisSeverity::Low,
            reasoning: "Symptoms could also indicate viral URTI. The fever pattern and lack of \
                        severe systemic symptoms make this a reasonable differential diagnosis."
                .into(),
            recommended_tests: strings(&[
                "Rapid strep test if available",
                "Monitor temperature trend",
                "Symptom monitoring for 48-72 hours",
            ]),
            referral_needed: false,
            treatment_options: strings(&[
                "Symptomatic treatment with rest",
                "Adequate fluid intake",
                "Paracetamol for fever and discomfort",
                "Steam inhalation for congestion",
            ]),
        },
        DiagnosisRecord {
            condition: "Pneumonia".into(),
            probability: 45,
            severity: DiagnosisSeverity::High,
            reasoning: "Given the respiratory symptoms and fever, pneumonia remains in the \
                        differential. Would require chest imaging for confirmation."
                .into(),
            recommended_tests: strings(&[
                "Chest X-ray (mandatory)",
                "Complete Blood Count",
                "Blood culture if severe",
                "Arterial blood gas if respiratory distress",
            ]),
            referral_needed: true,
            treatment_options: strings(&[
                "IV antibiotics if confirmed",
                "Oxygen therapy if needed",
                "Hospital admission consideration",
                "Close monitoring of vital signs",
            ]),
        },
    ]
}
