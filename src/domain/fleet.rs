// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Fleet Descriptor
//!
//! A fleet declares only its bounds. Choosing an instance count between
//! `min_size` and `max_size` is the orchestrator's scaling policy.

use serde::{Deserialize, Serialize};

use super::instance::{InstanceClass, InstanceShape, InstanceSize, MachineImage};
use super::invariants::{validate_fleet_bounds, ValidationResult};
use super::network::SubnetType;
use super::resource::ResourceId;

/// Configuration for a compute fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Instance shape (default `t3.micro`)
    pub shape: InstanceShape,
    /// Boot image (default latest Amazon Linux)
    pub image: MachineImage,
    /// Subnets instances launch into (default private with egress)
    pub placement: SubnetType,
    /// Lower bound (default 2, at least 1)
    pub min_size: u32,
    /// Upper bound (default 4)
    pub max_size: u32,
    /// Initial size, left to the orchestrator when unset
    pub desired_capacity: Option<u32>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            shape: InstanceShape::of(InstanceClass::Burstable3, InstanceSize::Micro),
            image: MachineImage::AmazonLinux,
            placement: SubnetType::PrivateWithEgress,
            min_size: 2,
            max_size: 4,
            desired_capacity: None,
        }
    }
}

/// Compute fleet descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeFleet {
    pub segment: ResourceId,
    pub group: ResourceId,
    pub shape: InstanceShape,
    pub image: MachineImage,
    pub placement: SubnetType,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub desired_capacity: Option<u32>,
}

impl ComputeFleet {
    pub fn new(segment: ResourceId, group: ResourceId, config: FleetConfig) -> Self {
        Self {
            segment,
            group,
            shape: config.shape,
            image: config.image,
            placement: config.placement,
            min_size: config.min_size,
            max_size: config.max_size,
            desired_capacity: config.desired_capacity,
        }
    }

    /// No elasticity when the bounds coincide
    pub fn is_fixed_size(&self) -> bool {
        self.min_size == self.max_size
    }

    pub fn validate(&self) -> ValidationResult {
        validate_fleet_bounds(self.min_size, self.max_size, self.desired_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet(config: FleetConfig) -> ComputeFleet {
        ComputeFleet::new(
            ResourceId::new("AppVPC").unwrap(),
            ResourceId::new("EC2SG").unwrap(),
            config,
        )
    }

    #[test]
    fn test_default_fleet() {
        let fleet = fleet(FleetConfig::default());
        assert_eq!(fleet.shape.as_str(), "t3.micro");
        assert_eq!((fleet.min_size, fleet.max_size), (2, 4));
        assert!(!fleet.is_fixed_size());
        assert!(fleet.validate().is_ok());
    }

    #[test]
    fn test_fixed_size_fleet_is_legal() {
        let fleet = fleet(FleetConfig {
            min_size: 3,
            max_size: 3,
            ..Default::default()
        });
        assert!(fleet.is_fixed_size());
        assert!(fleet.validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let fleet = fleet(FleetConfig {
            min_size: 5,
            max_size: 4,
            ..Default::default()
        });
        assert!(fleet.validate().is_err());
    }

    #[test]
    fn test_config_partial_deserialization() {
        let config: FleetConfig = serde_json::from_str(r#"{"min_size":1,"max_size":8}"#).unwrap();
        assert_eq!(config.min_size, 1);
        assert_eq!(config.max_size, 8);
        assert_eq!(config.shape.as_str(), "t3.micro");
    }
}
