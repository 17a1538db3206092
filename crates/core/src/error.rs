use intake_uuid::EntryId;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Please fill in patient information and symptoms before analyzing.")]
    MissingRequiredData,
    #[error("analysis already in progress")]
    AnalysisInProgress,

    #[error("session not found: {0}")]
    SessionNotFound(EntryId),
    #[error("symptom not found: {0}")]
    SymptomNotFound(EntryId),
    #[error("image not found: {0}")]
    ImageNotFound(EntryId),
    #[error("session registry lock poisoned")]
    RegistryPoisoned,

    #[error("invalid identifier: {0}")]
    Uuid(#[from] intake_uuid::UuidError),
    #[error("invalid text: {0}")]
    Text(#[from] intake_types::TextError),
    #[error("file error: {0}")]
    Files(#[from] intake_files::FilesError),
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
