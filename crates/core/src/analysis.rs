//! Analysis orchestration.
//!
//! The orchestrator is a small state machine:
//!
//! ```text
//! Idle ──trigger──> Running ──delay elapses──> Complete
//!   ^                  │                          │
//!   └──────cancel──────┘                          └──trigger──> Running ...
//! ```
//!
//! A trigger is refused unless the patient identity is filled in and at least one symptom is
//! listed. Entering `Running` evaluates the emergency rule and, after the configured delay,
//! the fixed reference diagnoses are published.
//!
//! The delay runs on a tokio task owned by the orchestrator. Cancelling, or dropping the
//! orchestrator along with its session, aborts that task, so no completion is ever published
//! for a session that no longer exists.

use crate::constants::{EMERGENCY_ALERT_COUNT, FEVER_ALERT_THRESHOLD_F};
use crate::diagnosis::{reference_diagnoses, DiagnosisRecord};
use crate::patient::PatientRecord;
use crate::symptoms::{SymptomEntry, SymptomSeverity, VitalSigns};
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Utc};
use intake_uuid::EntryId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AnalysisStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Running {
        #[schema(value_type = String)]
        run_id: EntryId,
        started_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        #[schema(value_type = String)]
        run_id: EntryId,
        completed_at: DateTime<Utc>,
        diagnoses: Vec<DiagnosisRecord>,
    },
}

impl AnalysisStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, AnalysisStatus::Running { .. })
    }

    fn is_run(&self, id: EntryId) -> bool {
        matches!(self, AnalysisStatus::Running { run_id, .. } if *run_id == id)
    }
}

/// What a successful trigger started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTicket {
    #[schema(value_type = String)]
    pub run_id: EntryId,
    /// Whether the emergency rule fired for this run
    pub emergency: bool,
    /// Alert counter after the rule was evaluated
    pub emergency_alerts: u32,
}

/// True when analysis may be triggered for this data.
pub fn has_required_data(patient: &PatientRecord, symptoms: &[SymptomEntry]) -> bool {
    patient.has_identity() && !symptoms.is_empty()
}

/// Any severe symptom, or a temperature reading above the fever threshold.
///
/// Temperatures that do not start with a number never fire the rule.
pub fn requires_emergency_alert(symptoms: &[SymptomEntry], vitals: &VitalSigns) -> bool {
    let severe = symptoms
        .iter()
        .any(|s| s.severity == SymptomSeverity::Severe);
    let fever = vitals
        .temperature_value()
        .is_some_and(|t| t > FEVER_ALERT_THRESHOLD_F);

    severe || fever
}

#[derive(Debug)]
pub struct AnalysisOrchestrator {
    delay: Duration,
    status: Arc<watch::Sender<AnalysisStatus>>,
    emergency_alerts: u32,
    pending: Option<JoinHandle<()>>,
}

impl AnalysisOrchestrator {
    pub fn new(delay: Duration) -> Self {
        let (status, _) = watch::channel(AnalysisStatus::Idle);
        Self {
            delay,
            status: Arc::new(status),
            emergency_alerts: 0,
            pending: None,
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    pub fn emergency_alerts(&self) -> u32 {
        self.emergency_alerts
    }

    /// Watch status transitions.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.status.subscribe()
    }

    /// Starts an analysis run.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `IntakeError::MissingRequiredData` if the patient identity is incomplete or no
    ///   symptom is listed. Nothing else changes.
    /// - `IntakeError::AnalysisInProgress` if a run is already running.
    pub fn trigger(
        &mut self,
        patient: &PatientRecord,
        symptoms: &[SymptomEntry],
        vitals: &VitalSigns,
    ) -> IntakeResult<AnalysisTicket> {
        if !has_required_data(patient, symptoms) {
            return Err(IntakeError::MissingRequiredData);
        }
        if self.is_running() {
            return Err(IntakeError::AnalysisInProgress);
        }

        let emergency = requires_emergency_alert(symptoms, vitals);
        if emergency {
            self.emergency_alerts = EMERGENCY_ALERT_COUNT;
            tracing::warn!("emergency alert raised for analysis run");
        }

        let run_id = EntryId::new();
        self.status.send_replace(AnalysisStatus::Running {
            run_id,
            started_at: Utc::now(),
        });
        tracing::info!("analysis run {} started", run_id);

        let status = Arc::clone(&self.status);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let published = status.send_if_modified(|current| {
                if !current.is_run(run_id) {
                    return false;
                }
                *current = AnalysisStatus::Complete {
                    run_id,
                    completed_at: Utc::now(),
                    diagnoses: reference_diagnoses(),
                };
                true
            });
            if published {
                tracing::info!("analysis run {} complete", run_id);
            }
        }));

        Ok(AnalysisTicket {
            run_id,
            emergency,
            emergency_alerts: self.emergency_alerts,
        })
    }

    /// Aborts a running analysis and returns to `Idle`.
    ///
    /// Returns false when nothing was running; a completed result is left in place.
    pub fn cancel(&mut self) -> bool {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let cancelled = self.status.send_if_modified(|current| {
            if !current.is_running() {
                return false;
            }
            *current = AnalysisStatus::Idle;
            true
        });
        if cancelled {
            tracing::info!("analysis run cancelled");
        }
        cancelled
    }

    /// Waits until no run is in progress and returns the settled status.
    pub async fn wait_until_settled(&self) -> AnalysisStatus {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| !s.is_running()).await;
        match settled {
            Ok(status) => status.clone(),
            // The sender lives as long as `self`, so this only happens mid-drop.
            Err(_) => self.status(),
        }
    }
}

impl Drop for AnalysisOrchestrator {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{PatientCollector, PatientField};
    use crate::symptoms::{SymptomChange, SymptomCollector, VitalField};

    const DELAY: Duration = Duration::from_millis(3_000);

    fn complete_patient() -> PatientRecord {
        let mut patient = PatientCollector::new();
        patient.set_field(PatientField::Name, "Meena".into()).unwrap();
        patient.set_field(PatientField::Age, "52".into()).unwrap();
        patient.set_field(PatientField::Gender, "female".into()).unwrap();
        patient.record().clone()
    }

    fn symptoms(names: &[&str]) -> SymptomCollector {
        let mut collector = SymptomCollector::new();
        for name in names {
            collector.add_symptom(name).unwrap();
        }
        collector
    }

    fn condition_names(status: &AnalysisStatus) -> Vec<String> {
        match status {
            AnalysisStatus::Complete { diagnoses, .. } => {
                diagnoses.iter().map(|d| d.condition.clone()).collect()
            }
            other => panic!("expected complete status, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_refused_without_patient_identity() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let collector = symptoms(&["Fever"]);

        let err = orchestrator
            .trigger(
                &PatientRecord::default(),
                collector.symptoms(),
                collector.vitals(),
            )
            .unwrap_err();

        assert!(matches!(err, IntakeError::MissingRequiredData));
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);
        assert_eq!(orchestrator.emergency_alerts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_refused_without_symptoms() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let mut vitals = VitalSigns::default();
        vitals.temperature = "106".into();

        let err = orchestrator
            .trigger(&complete_patient(), &[], &vitals)
            .unwrap_err();

        assert!(matches!(err, IntakeError::MissingRequiredData));
        assert!(!orchestrator.is_running());
        assert_eq!(orchestrator.emergency_alerts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_completes_after_delay_with_reference_set() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let collector = symptoms(&["Cough", "Fever"]);

        let ticket = orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();
        assert!(!ticket.emergency);
        assert!(orchestrator.is_running());

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert!(orchestrator.is_running());

        let status = orchestrator.wait_until_settled().await;
        assert_eq!(
            condition_names(&status),
            vec![
                "Acute Respiratory Infection",
                "Viral Upper Respiratory Tract Infection",
                "Pneumonia"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn output_is_identical_for_different_inputs() {
        let mut first = AnalysisOrchestrator::new(DELAY);
        let mut second = AnalysisOrchestrator::new(DELAY);

        let a = symptoms(&["Rash"]);
        let mut b = symptoms(&["Chest pain", "Dizziness", "Nausea"]);
        b.set_vital(VitalField::HeartRate, "130".into());

        first
            .trigger(&complete_patient(), a.symptoms(), a.vitals())
            .unwrap();
        second
            .trigger(&complete_patient(), b.symptoms(), b.vitals())
            .unwrap();

        let (s1, s2) = (
            first.wait_until_settled().await,
            second.wait_until_settled().await,
        );
        assert_eq!(condition_names(&s1), condition_names(&s2));
        match (s1, s2) {
            (
                AnalysisStatus::Complete { diagnoses: d1, .. },
                AnalysisStatus::Complete { diagnoses: d2, .. },
            ) => assert_eq!(d1, d2),
            _ => panic!("both runs should complete"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn severe_symptoms_set_alert_to_exactly_one() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let mut collector = symptoms(&["Chest pain", "Shortness of breath"]);
        let ids: Vec<_> = collector.symptoms().iter().map(|s| s.id).collect();
        for id in ids {
            collector
                .update_symptom(id, SymptomChange::Severity(SymptomSeverity::Severe))
                .unwrap();
        }

        let ticket = orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();
        assert!(ticket.emergency);
        assert_eq!(ticket.emergency_alerts, 1);

        orchestrator.wait_until_settled().await;
        orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();
        assert_eq!(orchestrator.emergency_alerts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn calm_rerun_keeps_previous_alert_count() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let patient = complete_patient();
        let mut collector = symptoms(&["Chest pain"]);
        let id = collector.symptoms()[0].id;
        collector
            .update_symptom(id, SymptomChange::Severity(SymptomSeverity::Severe))
            .unwrap();
        collector.set_vital(VitalField::Temperature, "105".into());

        let ticket = orchestrator
            .trigger(&patient, collector.symptoms(), collector.vitals())
            .unwrap();
        assert!(ticket.emergency);
        orchestrator.wait_until_settled().await;

        collector
            .update_symptom(id, SymptomChange::Severity(SymptomSeverity::Mild))
            .unwrap();
        collector.set_vital(VitalField::Temperature, "98.6".into());

        let ticket = orchestrator
            .trigger(&patient, collector.symptoms(), collector.vitals())
            .unwrap();
        assert!(!ticket.emergency);
        assert_eq!(ticket.emergency_alerts, 1);
        assert_eq!(orchestrator.emergency_alerts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn high_temperature_alone_sets_alert() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let mut collector = symptoms(&["Headache"]);
        collector.set_vital(VitalField::Temperature, "104.1".into());

        let ticket = orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();
        assert!(ticket.emergency);
        assert_eq!(orchestrator.emergency_alerts(), 1);
    }

    #[test]
    fn emergency_rule_boundaries() {
        let collector = symptoms(&["Fever"]);
        let mut vitals = VitalSigns::default();

        vitals.temperature = "104".into();
        assert!(!requires_emergency_alert(collector.symptoms(), &vitals));

        vitals.temperature = "hot".into();
        assert!(!requires_emergency_alert(collector.symptoms(), &vitals));

        vitals.temperature = "105 F".into();
        assert!(requires_emergency_alert(collector.symptoms(), &vitals));

        vitals.temperature = "Infinity".into();
        assert!(requires_emergency_alert(collector.symptoms(), &vitals));
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_while_running_is_refused() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let collector = symptoms(&["Cough"]);
        let patient = complete_patient();

        orchestrator
            .trigger(&patient, collector.symptoms(), collector.vitals())
            .unwrap();
        let err = orchestrator
            .trigger(&patient, collector.symptoms(), collector.vitals())
            .unwrap_err();
        assert!(matches!(err, IntakeError::AnalysisInProgress));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_completion() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let collector = symptoms(&["Cough"]);
        orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();

        assert!(orchestrator.cancel());
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);
        assert!(!orchestrator.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_orchestrator_aborts_pending_run() {
        let mut orchestrator = AnalysisOrchestrator::new(DELAY);
        let collector = symptoms(&["Cough"]);
        orchestrator
            .trigger(&complete_patient(), collector.symptoms(), collector.vitals())
            .unwrap();

        let mut rx = orchestrator.subscribe();
        rx.borrow_and_update();
        drop(orchestrator);

        tokio::time::sleep(DELAY * 2).await;
        // The task held the only other sender; once aborted the channel closes unchanged.
        assert!(rx.changed().await.is_err());
    }
}
