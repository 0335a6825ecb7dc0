//! Error types for the layer registry

use crate::codec::CodecError;
use layer_ledger_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Layer with id: {layer_id} does not exist")]
    LayerNotFound { layer_id: String },

    #[error("Layer with id: {layer_id} already exists")]
    LayerAlreadyExists { layer_id: String },

    #[error("Layer with id: {layer_id} already has this vulnerability with id: {vulnerability_id}")]
    VulnerabilityAlreadyAdded {
        layer_id: String,
        vulnerability_id: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Lineage of layer {layer_id} loops back on itself")]
    LineageCycle { layer_id: String },

    #[error("Lineage of layer {layer_id} exceeds {max_depth} layers")]
    LineageTooDeep { layer_id: String, max_depth: usize },

    #[error("Unknown transaction: {name}")]
    UnknownTransaction { name: String },

    #[error("Registry storage error: {0}")]
    Storage(StorageError),

    #[error("Failed to encode result: {0}")]
    Encoding(String),
}

/// Coarse failure classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    VulnerabilityAlreadyAdded,
    InvalidArgument,
    Internal,
}

impl RegistryError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            Self::LayerAlreadyExists { .. } => "LAYER_ALREADY_EXISTS",
            Self::VulnerabilityAlreadyAdded { .. } => "VULNERABILITY_ID_ALREADY_ADDED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::LineageCycle { .. } => "LAYER_LINEAGE_CYCLE",
            Self::LineageTooDeep { .. } => "LAYER_LINEAGE_TOO_DEEP",
            Self::UnknownTransaction { .. } => "UNKNOWN_TRANSACTION",
            Self::Storage(_) => "STORAGE_FAILURE",
            Self::Encoding(_) => "ENCODING_FAILURE",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LayerNotFound { .. } => ErrorKind::NotFound,
            Self::LayerAlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::VulnerabilityAlreadyAdded { .. } => ErrorKind::VulnerabilityAlreadyAdded,
            Self::InvalidArgument(_)
            | Self::LineageCycle { .. }
            | Self::LineageTooDeep { .. }
            | Self::UnknownTransaction { .. } => ErrorKind::InvalidArgument,
            Self::Storage(_) | Self::Encoding(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(layer_id: &str) -> Self {
        Self::LayerNotFound {
            layer_id: layer_id.to_string(),
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        match err {
            // A bookmark is caller input, not a store fault.
            StorageError::InvalidBookmark { bookmark } => {
                Self::InvalidArgument(format!("unknown page id: {bookmark}"))
            }
            other => Self::Storage(other),
        }
    }
}

impl From<CodecError> for RegistryError {
    fn from(err: CodecError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
