//! Intake sessions and the in-memory session registry.
//!
//! An [`IntakeSession`] owns one form's worth of state: the three collectors and the analysis
//! orchestrator. Field-level edits arrive as [`IntakeUpdate`] messages through
//! [`IntakeSession::apply`], which returns the snapshot of the section that changed.
//!
//! [`IntakeService`] keeps sessions keyed by id. Closing a session cancels any analysis still
//! running for it. Uploads through the service decode without holding the session lock, so
//! edits and reads on the same session proceed while a batch is decoding.

use crate::analysis::{has_required_data, AnalysisOrchestrator, AnalysisStatus, AnalysisTicket};
use crate::config::CoreConfig;
use crate::constants::REQUIRED_DATA_HINT;
use crate::images::{ImageChange, ImageCollector, ImageSnapshot, PendingDecodes};
use crate::patient::{PatientCollector, PatientField, PatientRecord};
use crate::presenter::{present, ResultView};
use crate::status::StatusBanner;
use crate::symptoms::{CommonSymptom, SymptomChange, SymptomCollector, SymptomSnapshot, VitalField};
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Utc};
use intake_files::{FileSelection, ImagePayload};
use intake_uuid::EntryId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use utoipa::ToSchema;

/// A single edit to an intake session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntakeUpdate {
    Patient { field: PatientField, value: String },
    Vital { field: VitalField, value: String },
    AddSymptom(String),
    UpdateSymptom { id: EntryId, change: SymptomChange },
    RemoveSymptom(EntryId),
    UpdateImage { id: EntryId, change: ImageChange },
    RemoveImage(EntryId),
    SetPreview(EntryId),
    ClearPreview,
}

/// The section snapshot returned after an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionSnapshot {
    Patient(PatientRecord),
    Symptoms(SymptomSnapshot),
    Images(ImageSnapshot),
}

/// Full read-only view of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[schema(value_type = String)]
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub patient: PatientRecord,
    pub symptoms: SymptomSnapshot,
    pub images: ImageSnapshot,
    pub analysis: AnalysisStatus,
    /// Whether the analysis control is enabled
    pub can_analyze: bool,
    /// Shown next to the analysis control while it is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_hint: Option<String>,
    pub banner: StatusBanner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[schema(value_type = String)]
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub patient_name: String,
    pub symptom_count: usize,
    pub image_count: usize,
    pub analysis_running: bool,
}

#[derive(Debug)]
pub struct IntakeSession {
    id: EntryId,
    created_at: DateTime<Utc>,
    patient: PatientCollector,
    symptoms: SymptomCollector,
    images: ImageCollector,
    analysis: AnalysisOrchestrator,
}

impl IntakeSession {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            id: EntryId::new(),
            created_at: Utc::now(),
            patient: PatientCollector::new(),
            symptoms: SymptomCollector::new(),
            images: ImageCollector::new(),
            analysis: AnalysisOrchestrator::new(cfg.analysis_delay()),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn patient(&self) -> &PatientRecord {
        self.patient.record()
    }

    /// Applies one edit and returns the snapshot of the section it touched.
    ///
    /// # Errors
    ///
    /// Propagates the collector error; the session is unchanged when an edit fails.
    pub fn apply(&mut self, update: IntakeUpdate) -> IntakeResult<SectionSnapshot> {
        let snapshot = match update {
            IntakeUpdate::Patient { field, value } => {
                SectionSnapshot::Patient(self.patient.set_field(field, value)?)
            }
            IntakeUpdate::Vital { field, value } => {
                SectionSnapshot::Symptoms(self.symptoms.set_vital(field, value))
            }
            IntakeUpdate::AddSymptom(name) => {
                SectionSnapshot::Symptoms(self.symptoms.add_symptom(&name)?)
            }
            IntakeUpdate::UpdateSymptom { id, change } => {
                SectionSnapshot::Symptoms(self.symptoms.update_symptom(id, change)?)
            }
            IntakeUpdate::RemoveSymptom(id) => {
                SectionSnapshot::Symptoms(self.symptoms.remove_symptom(id)?)
            }
            IntakeUpdate::UpdateImage { id, change } => {
                SectionSnapshot::Images(self.images.update_image(id, change)?)
            }
            IntakeUpdate::RemoveImage(id) => SectionSnapshot::Images(self.images.remove_image(id)?),
            IntakeUpdate::SetPreview(id) => SectionSnapshot::Images(self.images.set_preview(id)?),
            IntakeUpdate::ClearPreview => SectionSnapshot::Images(self.images.clear_preview()),
        };
        Ok(snapshot)
    }

    /// Decodes a batch of uploads into the image list.
    ///
    /// Holds `&mut self` for the whole batch. Shared sessions go through
    /// [`IntakeService::add_images`] instead.
    pub async fn add_images(&mut self, batch: Vec<FileSelection>) -> ImageSnapshot {
        let added = self.images.add_files(batch).await;
        tracing::debug!("session {}: {} image(s) added", self.id, added.len());
        self.images.snapshot()
    }

    /// Appends one already decoded upload.
    pub fn push_image(&mut self, payload: ImagePayload) -> EntryId {
        self.images.push_decoded(payload)
    }

    pub fn images(&self) -> ImageSnapshot {
        self.images.snapshot()
    }

    pub fn common_symptoms(&self) -> Vec<CommonSymptom> {
        self.symptoms.common_symptoms()
    }

    pub fn can_analyze(&self) -> bool {
        has_required_data(self.patient.record(), self.symptoms.symptoms())
    }

    /// # Errors
    ///
    /// See [`AnalysisOrchestrator::trigger`].
    pub fn trigger_analysis(&mut self) -> IntakeResult<AnalysisTicket> {
        self.analysis.trigger(
            self.patient.record(),
            self.symptoms.symptoms(),
            self.symptoms.vitals(),
        )
    }

    pub fn cancel_analysis(&mut self) -> bool {
        self.analysis.cancel()
    }

    pub fn analysis_status(&self) -> AnalysisStatus {
        self.analysis.status()
    }

    /// Waits for the current run, if any, to finish.
    pub async fn wait_for_analysis(&self) -> AnalysisStatus {
        self.analysis.wait_until_settled().await
    }

    pub fn results(&self) -> ResultView {
        present(&self.analysis.status(), self.can_analyze())
    }

    pub fn status_banner(&self) -> StatusBanner {
        StatusBanner::new(self.analysis.emergency_alerts())
    }

    pub fn view(&self) -> SessionView {
        let can_analyze = self.can_analyze();
        SessionView {
            id: self.id,
            created_at: self.created_at,
            patient: self.patient.record().clone(),
            symptoms: self.symptoms.snapshot(),
            images: self.images.snapshot(),
            analysis: self.analysis.status(),
            can_analyze,
            analysis_hint: (!can_analyze).then(|| REQUIRED_DATA_HINT.to_string()),
            banner: self.status_banner(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            patient_name: self.patient.record().name.clone(),
            symptom_count: self.symptoms.symptoms().len(),
            image_count: self.images.images().len(),
            analysis_running: self.analysis.is_running(),
        }
    }
}

pub type SharedSession = Arc<Mutex<IntakeSession>>;

/// In-memory registry of intake sessions.
#[derive(Clone, Debug)]
pub struct IntakeService {
    cfg: Arc<CoreConfig>,
    sessions: Arc<RwLock<HashMap<EntryId, SharedSession>>>,
}

impl IntakeService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Opens a new empty session.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::RegistryPoisoned` if the registry lock is poisoned.
    pub fn create_session(&self) -> IntakeResult<(EntryId, SharedSession)> {
        let session = IntakeSession::new(&self.cfg);
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));

        self.sessions
            .write()
            .map_err(|_| IntakeError::RegistryPoisoned)?
            .insert(id, Arc::clone(&shared));

        tracing::info!("intake session {} created", id);
        Ok((id, shared))
    }

    /// # Errors
    ///
    /// Returns `IntakeError::SessionNotFound` for an unknown id.
    pub fn session(&self, id: EntryId) -> IntakeResult<SharedSession> {
        self.sessions
            .read()
            .map_err(|_| IntakeError::RegistryPoisoned)?
            .get(&id)
            .cloned()
            .ok_or(IntakeError::SessionNotFound(id))
    }

    /// Decodes a batch of uploads into a session's image list.
    ///
    /// The session lock is taken once per finished decode, so images still land in
    /// completion order while other requests on the session are served in between.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::SessionNotFound` for an unknown id.
    pub async fn add_images(
        &self,
        id: EntryId,
        batch: Vec<FileSelection>,
    ) -> IntakeResult<ImageSnapshot> {
        let session = self.session(id)?;
        let mut decodes = PendingDecodes::spawn(batch);

        let mut added = 0;
        while let Some(payload) = decodes.next().await {
            session.lock().await.push_image(payload);
            added += 1;
        }
        tracing::debug!("session {}: {} image(s) added", id, added);

        let snapshot = session.lock().await.images();
        Ok(snapshot)
    }

    /// Summaries of every open session, oldest first.
    pub async fn list_sessions(&self) -> IntakeResult<Vec<SessionSummary>> {
        let sessions: Vec<SharedSession> = self
            .sessions
            .read()
            .map_err(|_| IntakeError::RegistryPoisoned)?
            .values()
            .cloned()
            .collect();

        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            summaries.push(session.lock().await.summary());
        }
        summaries.sort_by_key(|s| (s.created_at, s.id));
        Ok(summaries)
    }

    /// Removes a session and cancels its pending analysis.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::SessionNotFound` for an unknown id.
    pub async fn close_session(&self, id: EntryId) -> IntakeResult<()> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| IntakeError::RegistryPoisoned)?
            .remove(&id)
            .ok_or(IntakeError::SessionNotFound(id))?;

        if removed.lock().await.cancel_analysis() {
            tracing::info!("pending analysis for session {} cancelled", id);
        }
        tracing::info!("intake session {} closed", id);
        Ok(())
    }
}

impl Default for IntakeService {
    fn default() -> Self {
        Self::new(Arc::new(CoreConfig::default()))
    }
}
