use thiserror::Error;

use crate::types::PatientId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("No baseline entry for patient {patient_id}")]
    MissingBaseline { patient_id: PatientId },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
