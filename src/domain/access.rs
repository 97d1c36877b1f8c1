// Copyright (c) 2025 - Cowboy AI, Inc.
//! Access Groups and Access Policies
//!
//! Every balancer, fleet and database is bound to an [`AccessGroup`]. Traffic
//! into a group is denied unless an [`AccessPolicy`] owned by that group admits
//! it. Policies are additive: a flow is permitted when any one policy matches.
//!
//! A policy source is either any external address or another named group.
//! Only groups with the [`SegmentRole::Edge`] role may admit any address.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::network::{Port, Protocol};
use super::resource::ResourceId;

/// Tier a group belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRole {
    /// Public entry point
    Edge,
    /// Application instances
    Compute,
    /// Data tier
    Database,
}

impl SegmentRole {
    /// Whether a policy on a group of this role may admit any address
    pub fn accepts_any_address(&self) -> bool {
        matches!(self, SegmentRole::Edge)
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentRole::Edge => write!(f, "edge"),
            SegmentRole::Compute => write!(f, "compute"),
            SegmentRole::Database => write!(f, "database"),
        }
    }
}

/// Configuration for an access group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupConfig {
    pub role: SegmentRole,
    pub description: String,
    /// Permit all outbound traffic (default true)
    #[serde(default = "default_allow_all_outbound")]
    pub allow_all_outbound: bool,
}

fn default_allow_all_outbound() -> bool {
    true
}

impl AccessGroupConfig {
    pub fn new(role: SegmentRole, description: impl Into<String>) -> Self {
        Self {
            role,
            description: description.into(),
            allow_all_outbound: true,
        }
    }

    pub fn with_allow_all_outbound(mut self, allow: bool) -> Self {
        self.allow_all_outbound = allow;
        self
    }
}

/// Access group descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroup {
    pub segment: ResourceId,
    pub role: SegmentRole,
    pub description: String,
    pub allow_all_outbound: bool,
}

impl AccessGroup {
    pub fn new(segment: ResourceId, config: AccessGroupConfig) -> Self {
        Self {
            segment,
            role: config.role,
            description: config.description,
            allow_all_outbound: config.allow_all_outbound,
        }
    }
}

/// Origin of traffic a policy admits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    /// Any external IPv4 address
    AnyAddress,
    /// Members of another access group
    Group(ResourceId),
}

impl PolicySource {
    pub fn is_any_address(&self) -> bool {
        matches!(self, PolicySource::AnyAddress)
    }

    /// Referenced group, if any
    pub fn group(&self) -> Option<&ResourceId> {
        match self {
            PolicySource::AnyAddress => None,
            PolicySource::Group(id) => Some(id),
        }
    }
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySource::AnyAddress => write!(f, "0.0.0.0/0"),
            PolicySource::Group(id) => write!(f, "group:{}", id),
        }
    }
}

/// Single ingress rule owned by an access group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Group this policy admits traffic into
    pub owner: ResourceId,
    pub source: PolicySource,
    pub port: Port,
    pub protocol: Protocol,
    pub description: String,
}

impl AccessPolicy {
    /// Whether traffic from `source` on `port`/`protocol` matches this policy
    ///
    /// An any-address policy matches every source, including groups.
    pub fn admits(&self, source: &PolicySource, port: Port, protocol: Protocol) -> bool {
        self.port == port
            && self.protocol == protocol
            && (self.source.is_any_address() || self.source == *source)
    }
}
