// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Identity and Kind Taxonomy
//!
//! Every declaration in the graph is keyed by a [`ResourceId`], a stable
//! logical identifier chosen by the author of the topology (e.g. `AppVPC`).
//! Identifiers never contain random components, so building the same topology
//! twice yields the same graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resource identifier validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceIdError {
    #[error("Resource identifier is empty")]
    Empty,

    #[error("Resource identifier exceeds maximum length of 255 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in resource identifier: {0:?}")]
    InvalidCharacter(char),

    #[error("Resource identifier must start with a letter: {0}")]
    InvalidStart(String),
}

/// Stable logical identifier of a declared resource
///
/// Invariants:
/// - 1 to 255 characters
/// - ASCII alphanumeric only
/// - Starts with a letter
///
/// # Examples
///
/// ```rust
/// use three_tier_topology::domain::ResourceId;
///
/// let id = ResourceId::new("AppVPC").unwrap();
/// assert_eq!(id.as_str(), "AppVPC");
///
/// assert!(ResourceId::new("").is_err());
/// assert!(ResourceId::new("9lives").is_err());
/// assert!(ResourceId::new("App-VPC").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Maximum identifier length
    pub const MAX_LENGTH: usize = 255;

    /// Create a new identifier with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ResourceIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(ResourceIdError::Empty);
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(ResourceIdError::TooLong(id.len()));
        }

        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ResourceIdError::InvalidCharacter(c));
        }

        if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(ResourceIdError::InvalidStart(id));
        }

        Ok(Self(id))
    }

    /// Derive a child identifier by appending a suffix
    pub fn child(&self, suffix: impl fmt::Display) -> Result<Self, ResourceIdError> {
        Self::new(format!("{}{}", self.0, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ResourceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Taxonomy of resources a topology can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Isolated address space with subnets
    NetworkSegment,
    /// Group a resource is bound to; policies gate traffic into it
    AccessGroup,
    /// Single ingress rule on an access group
    AccessPolicy,
    /// Public traffic distributor
    EdgeBalancer,
    /// Port a balancer accepts traffic on
    Listener,
    /// Edge from a listener into a compute fleet
    TargetRegistration,
    /// Elastic pool of identical instances
    ComputeFleet,
    /// Generated secret descriptor
    CredentialMaterial,
    /// Provider-operated relational database
    ManagedDatabase,
}

impl ResourceKind {
    /// All kinds, leaves first
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::NetworkSegment,
        ResourceKind::AccessGroup,
        ResourceKind::AccessPolicy,
        ResourceKind::EdgeBalancer,
        ResourceKind::Listener,
        ResourceKind::TargetRegistration,
        ResourceKind::ComputeFleet,
        ResourceKind::CredentialMaterial,
        ResourceKind::ManagedDatabase,
    ];

    /// Snake-case name used in serialized graphs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::NetworkSegment => "network_segment",
            ResourceKind::AccessGroup => "access_group",
            ResourceKind::AccessPolicy => "access_policy",
            ResourceKind::EdgeBalancer => "edge_balancer",
            ResourceKind::Listener => "listener",
            ResourceKind::TargetRegistration => "target_registration",
            ResourceKind::ComputeFleet => "compute_fleet",
            ResourceKind::CredentialMaterial => "credential_material",
            ResourceKind::ManagedDatabase => "managed_database",
        }
    }

    /// Provider resource type the orchestrator materializes this kind as
    pub fn provider_type(&self) -> &'static str {
        match self {
            ResourceKind::NetworkSegment => "AWS::EC2::VPC",
            ResourceKind::AccessGroup => "AWS::EC2::SecurityGroup",
            ResourceKind::AccessPolicy => "AWS::EC2::SecurityGroupIngress",
            ResourceKind::EdgeBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            ResourceKind::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            ResourceKind::TargetRegistration => "AWS::ElasticLoadBalancingV2::TargetGroup",
            ResourceKind::ComputeFleet => "AWS::AutoScaling::AutoScalingGroup",
            ResourceKind::CredentialMaterial => "AWS::SecretsManager::Secret",
            ResourceKind::ManagedDatabase => "AWS::RDS::DBInstance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
