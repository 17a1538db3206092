//! # Intake Core
//!
//! Core business logic for the clinic intake form.
//!
//! This crate holds the form state and its rules:
//! - Patient identity, symptoms and vitals, and uploaded image collectors
//! - The analysis orchestrator (required-data guard, emergency rule, delayed fixed results)
//! - Result presentation and the status banner
//! - In-memory intake sessions keyed by id
//!
//! **No API concerns**: HTTP servers and request/response wire types belong in `api-rest` and
//! `api-shared`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod diagnosis;
pub mod error;
pub mod images;
pub mod patient;
pub mod presenter;
pub mod session;
pub mod status;
pub mod symptoms;

pub use analysis::{AnalysisOrchestrator, AnalysisStatus, AnalysisTicket};
pub use config::CoreConfig;
pub use diagnosis::{reference_diagnoses, DiagnosisRecord, DiagnosisSeverity};
pub use error::{IntakeError, IntakeResult};
pub use images::{
    ImageChange, ImageCollector, ImageSnapshot, ImageType, MedicalImage, PendingDecodes,
};
pub use patient::{Gender, PatientCollector, PatientField, PatientRecord};
pub use presenter::{
    present, render_text, CriticalAlert, Likelihood, RankedDiagnosis, ResultView,
};
pub use session::{
    IntakeService, IntakeSession, IntakeUpdate, SectionSnapshot, SessionSummary, SessionView,
    SharedSession,
};
pub use status::StatusBanner;
pub use symptoms::{
    CommonSymptom, SymptomChange, SymptomCollector, SymptomEntry, SymptomSeverity,
    SymptomSnapshot, VitalField, VitalSigns,
};

pub use intake_files::FileSelection;
pub use intake_uuid::EntryId;
