//! Error types for the micro-segmentation compiler

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Kind of named object a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Application known to the topology provider
    Application,
    /// Fabric tenant (`fvTenant`)
    Tenant,
    /// Application profile (`fvAp`)
    ApplicationProfile,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Application => "application",
            Self::Tenant => "tenant",
            Self::ApplicationProfile => "application profile",
        };
        f.write_str(label)
    }
}

/// Micro-segmentation error type
#[derive(Error, Debug)]
pub enum MicrosegError {
    /// Missing or invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Named object does not exist
    #[error("{kind} {name} doesn't exist")]
    NotFound { kind: ResourceKind, name: String },

    /// Network or authentication failure reaching a collaborator
    #[error("transport error: {0}")]
    Transport(String),

    /// Controller refused the configuration transaction
    #[error("commit rejected by controller (code {code}): {text}")]
    CommitRejected { code: String, text: String },

    /// Topology input failed parsing
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A shared fabric resource could not be determined
    #[error("unresolved shared resource: {0}")]
    Unresolved(String),

    /// Graph validation found errors
    #[error("policy graph failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Caller-supplied deadline elapsed
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl MicrosegError {
    /// Create a not-found error for the given kind and name
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a transport error with the given message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an invalid-topology error with the given message
    pub fn invalid_topology(msg: impl Into<String>) -> Self {
        Self::InvalidTopology(msg.into())
    }

    /// Create a config error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for micro-segmentation operations
pub type Result<T> = std::result::Result<T, MicrosegError>;
