//! Error types for plugin sessions

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantiationStage {
    Lookup,
    Instantiation,
    Connection,
}

impl std::fmt::Display for InstantiationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstantiationStage::Lookup => write!(f, "looking up component"),
            InstantiationStage::Instantiation => write!(f, "creating instance"),
            InstantiationStage::Connection => write!(f, "connecting to audio graph"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetOperation {
    Save,
    Delete,
    Load,
}

impl std::fmt::Display for PresetOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresetOperation::Save => write!(f, "save"),
            PresetOperation::Delete => write!(f, "delete"),
            PresetOperation::Load => write!(f, "load"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Plugin instantiation failed at {stage} stage: {name}\n  Reason: {reason}")]
    Instantiation {
        name: String,
        stage: InstantiationStage,
        reason: String,
    },

    #[error("Preset {operation} failed: {reason}")]
    Persistence {
        operation: PresetOperation,
        reason: String,
    },

    #[error("No active plugin instance")]
    NoActiveInstance,

    #[error("Descriptor index {index} out of range ({len} discovered)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Selection superseded by a newer request")]
    Superseded,

    #[error("Registry query failed: {0}")]
    Registry(String),

    #[error("Audio graph error: {0}")]
    Graph(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn instantiation(
        name: impl Into<String>,
        stage: InstantiationStage,
        reason: impl Into<String>,
    ) -> Self {
        SessionError::Instantiation {
            name: name.into(),
            stage,
            reason: reason.into(),
        }
    }

    pub fn persistence(operation: PresetOperation, reason: impl Into<String>) -> Self {
        SessionError::Persistence {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
