// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology declaration
//!
//! Three families of failure exist when building a declaration graph:
//!
//! - [`GraphIntegrityError`]: a reference cannot be resolved, points forward in
//!   declaration order, or names a resource of the wrong kind. Always fatal.
//! - [`InvariantViolation`]: a descriptor is structurally invalid
//!   (see [`crate::domain::invariants`]). Always fatal.
//! - [`PolicyGap`]: a resource is declared but nothing may reach it. Fatal or
//!   advisory depending on [`crate::config::PolicyGapMode`].
//!
//! Parsed manifests can additionally fail with a [`ManifestError`] when their
//! header disagrees with the graph they carry.
//!
//! Provider-side failures (quota, permissions, engine compatibility) never
//! appear here; they belong to the orchestrator that consumes the graph.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::domain::invariants::InvariantViolation;
use crate::domain::network::{NetworkError, Port};
use crate::domain::resource::{ResourceId, ResourceIdError, ResourceKind};

/// Structural errors in the declaration graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphIntegrityError {
    /// Two declarations share one identifier
    #[error("Duplicate resource identifier: {0}")]
    DuplicateIdentifier(ResourceId),

    /// A reference names an identifier absent from the graph
    #[error("{from}.{field} references unknown resource {to}")]
    UnknownReference {
        from: ResourceId,
        field: String,
        to: ResourceId,
    },

    /// A reference names a resource declared later (or itself)
    #[error("{from}.{field} references {to}, which is not declared before it")]
    ForwardReference {
        from: ResourceId,
        field: String,
        to: ResourceId,
    },

    /// A reference resolves to a resource of the wrong kind
    #[error("{from}.{field} expects a {expected} but {to} is a {actual}")]
    KindMismatch {
        from: ResourceId,
        field: String,
        to: ResourceId,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    /// Identifier failed validation
    #[error("Invalid resource identifier: {0}")]
    InvalidIdentifier(#[from] ResourceIdError),

    /// Serialized graph uses a format this crate does not read
    #[error("Unsupported graph format version {found} (expected {expected})")]
    UnsupportedFormatVersion { found: u32, expected: u32 },
}

/// A declared resource that no access policy lets traffic reach
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyGap {
    /// Listener port is not admitted on the balancer's group
    #[error("Listener {listener} on {balancer}: group {group} admits no traffic on port {port}")]
    ListenerUnreachable {
        listener: ResourceId,
        balancer: ResourceId,
        group: ResourceId,
        port: Port,
    },

    /// Fleet group does not admit the balancer group on the target port
    #[error("Targets of {listener}: fleet {fleet} group {group} does not admit balancer traffic on port {port}")]
    TargetsUnreachable {
        listener: ResourceId,
        fleet: ResourceId,
        group: ResourceId,
        port: Port,
    },

    /// Database group does not admit any compute group on the engine port
    #[error("Database {database}: group {group} admits no compute traffic on port {port}")]
    DatabaseUnreachable {
        database: ResourceId,
        group: ResourceId,
        port: Port,
    },
}

impl PolicyGap {
    /// The resource left unreachable
    pub fn resource(&self) -> &ResourceId {
        match self {
            PolicyGap::ListenerUnreachable { listener, .. } => listener,
            PolicyGap::TargetsUnreachable { fleet, .. } => fleet,
            PolicyGap::DatabaseUnreachable { database, .. } => database,
        }
    }
}

/// A parsed manifest disagrees with itself
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Unsupported manifest format version {found} (expected {expected})")]
    UnsupportedFormatVersion { found: u32, expected: u32 },

    #[error("Manifest stack id {found} does not match its environment ({expected})")]
    StackIdMismatch { found: Uuid, expected: Uuid },

    #[error("Manifest lists exposed groups {declared:?} but its graph exposes {derived:?}")]
    ExposureMismatch {
        declared: Vec<ResourceId>,
        derived: Vec<ResourceId>,
    },
}

/// Errors that can occur while declaring, validating or synthesizing a topology
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Graph integrity error
    #[error("Graph integrity error: {0}")]
    GraphIntegrity(#[from] GraphIntegrityError),

    /// Invariant violation
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Unreachable resource
    #[error("Policy gap: {0}")]
    PolicyGap(#[from] PolicyGap),

    /// Network value error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inconsistent manifest
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<ResourceIdError> for TopologyError {
    fn from(err: ResourceIdError) -> Self {
        TopologyError::GraphIntegrity(GraphIntegrityError::InvalidIdentifier(err))
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Serialization(err.to_string())
    }
}
