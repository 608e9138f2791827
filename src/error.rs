use std::{fmt, io};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[cfg(feature = "service")]
use sqlx::Error as SqlxError;

use crate::properties::NodeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum HierarchyError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Operation would create a cycle in the hierarchy ({parent} -> {child})")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("Node {child} already has parent {parent}; update the existing hierarchy entry instead")]
    DuplicateChild { child: NodeId, parent: NodeId },
    #[error("Invalid relation kind: {0}")]
    InvalidRelationKind(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Hierarchy entry not found for child {0}")]
    NotFound(NodeId),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    /// Opaque failure of the graph store collaborator, passed through untouched.
    #[error("Graph store error: {0}")]
    Store(String),
}

impl HierarchyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HierarchyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HierarchyError::CycleDetected { .. } => StatusCode::BAD_REQUEST,
            HierarchyError::DuplicateChild { .. } => StatusCode::CONFLICT,
            HierarchyError::InvalidRelationKind(_) => StatusCode::BAD_REQUEST,
            HierarchyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HierarchyError::NotFound(_) => StatusCode::NOT_FOUND,
            HierarchyError::Serialization(_) => StatusCode::BAD_REQUEST,
            HierarchyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Local validation failures are reported to the caller and never retried.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            HierarchyError::CycleDetected { .. }
                | HierarchyError::DuplicateChild { .. }
                | HierarchyError::InvalidRelationKind(_)
                | HierarchyError::NotFound(_)
        )
    }
}

impl From<toml::de::Error> for HierarchyError {
    fn from(src: toml::de::Error) -> HierarchyError {
        HierarchyError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for HierarchyError {
    fn from(src: toml::ser::Error) -> HierarchyError {
        HierarchyError::Config(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for HierarchyError {
    fn from(src: JsonError) -> HierarchyError {
        HierarchyError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for HierarchyError {
    fn from(x: io::Error) -> Self {
        HierarchyError::Io(format!("IOError: {}: {x}", x.kind()))
    }
}

impl From<fmt::Error> for HierarchyError {
    fn from(x: fmt::Error) -> Self {
        HierarchyError::Serialization(format!("{x}"))
    }
}

#[cfg(feature = "service")]
impl From<SqlxError> for HierarchyError {
    fn from(db_error: SqlxError) -> Self {
        HierarchyError::Store(format!("database error: {db_error:?}"))
    }
}

#[cfg(feature = "service")]
impl From<sqlx::migrate::MigrateError> for HierarchyError {
    fn from(migrate_error: sqlx::migrate::MigrateError) -> Self {
        HierarchyError::Store(format!("migration error: {migrate_error}"))
    }
}
