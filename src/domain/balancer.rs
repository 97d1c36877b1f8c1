// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Balancer, Listeners and Target Registrations

use serde::{Deserialize, Serialize};

use super::network::{Port, Protocol, SubnetType};
use super::resource::ResourceId;

/// Configuration for an edge balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Accept traffic from outside the segment (default true)
    pub internet_facing: bool,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            internet_facing: true,
        }
    }
}

/// Edge balancer descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeBalancer {
    pub segment: ResourceId,
    pub group: ResourceId,
    pub internet_facing: bool,
}

impl EdgeBalancer {
    /// Subnets the balancer nodes are placed in
    pub fn placement(&self) -> SubnetType {
        if self.internet_facing {
            SubnetType::Public
        } else {
            SubnetType::PrivateWithEgress
        }
    }
}

/// Port a balancer accepts traffic on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub balancer: ResourceId,
    pub port: Port,
    pub protocol: Protocol,
}

/// Forwarding edge from a listener into a compute fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistration {
    pub listener: ResourceId,
    pub fleet: ResourceId,
    /// Port traffic is forwarded to on each instance
    pub port: Port,
}
