// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Resource descriptors and value objects for a three-tier topology, each
//! validated on construction or through the pure functions in [`invariants`].
//!
//! # Value Objects with Invariants
//!
//! - [`ResourceId`] - stable logical identifier
//! - [`Ipv4Cidr`] - aligned IPv4 range in CIDR notation
//! - [`Port`] - transport port (1-65535)
//! - [`InstanceShape`] - instance `<class>.<size>`
//! - [`GenerationPolicy`] - exclusion rules for generated secrets
//!
//! # Descriptors
//!
//! - [`NetworkSegment`] - address space, zones and subnets
//! - [`AccessGroup`] / [`AccessPolicy`] - default-deny segmentation
//! - [`EdgeBalancer`] / [`Listener`] / [`TargetRegistration`] - ingress
//! - [`ComputeFleet`] - bounded instance pool
//! - [`CredentialMaterial`] - generated secret layout
//! - [`ManagedDatabase`] - private relational instance
//!
//! Descriptors refer to one another only through [`ResourceId`]s; the
//! declaration graph resolves and checks those references.

pub mod access;
pub mod balancer;
pub mod credential;
pub mod database;
pub mod fleet;
pub mod instance;
pub mod invariants;
pub mod network;
pub mod resource;

pub use access::{AccessGroup, AccessGroupConfig, AccessPolicy, PolicySource, SegmentRole};
pub use balancer::{BalancerConfig, EdgeBalancer, Listener, TargetRegistration};
pub use credential::{CredentialMaterial, GenerationPolicy};
pub use database::{DatabaseConfig, EngineFamily, EngineSpec, ManagedDatabase, StorageConfig};
pub use fleet::{ComputeFleet, FleetConfig};
pub use instance::{InstanceClass, InstanceShape, InstanceShapeError, InstanceSize, MachineImage};
pub use invariants::{InvariantViolation, ValidationResult};
pub use network::{
    Ipv4Cidr, NetworkError, NetworkSegment, NetworkSegmentConfig, Port, Protocol, Subnet,
    SubnetType,
};
pub use resource::{ResourceId, ResourceIdError, ResourceKind};
