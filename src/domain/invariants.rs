// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! All structural rules a declaration must satisfy before the graph is handed
//! to an orchestrator. Functions are pure: no I/O, no mutation, deterministic.
//! The build context calls them as each resource is declared and the graph
//! validator calls them again over the finished graph, so deserialized graphs
//! get the same checks as freshly built ones.
//!
//! # Invariant Categories
//!
//! 1. **Network**: zone count, subnet group layout
//! 2. **Segmentation**: no open ingress into private tiers, role consistency
//! 3. **Capacity**: fleet and storage bounds
//! 4. **Exposure**: databases stay private
//! 5. **Credentials**: field layout and generation policy

use std::collections::BTreeMap;

use super::access::{PolicySource, SegmentRole};
use super::network::SubnetType;
use super::resource::ResourceId;

/// Validation result with detailed error information
pub type ValidationResult = Result<(), InvariantViolation>;

/// Minimum zones for the balancer and fleet to be viable
pub const MIN_AVAILABILITY_ZONES: u8 = 2;

/// Most zones any region offers
pub const MAX_AVAILABILITY_ZONES: u8 = 6;

/// Structural invariant violated by a declaration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Network segment spans {requested} availability zones, at least {minimum} required")]
    InsufficientAvailabilityZones { requested: u8, minimum: u8 },

    #[error("Network segment spans {requested} availability zones, at most {maximum} supported")]
    TooManyAvailabilityZones { requested: u8, maximum: u8 },

    #[error("Network segment declares no subnet groups")]
    NoSubnetGroups,

    #[error("Subnet group {0} declared more than once")]
    DuplicateSubnetGroup(SubnetType),

    #[error("Egress subnets require a public subnet group for NAT gateways")]
    EgressWithoutPublicSubnets,

    #[error("{resource} is placed in {subnet_type} subnets, which its segment does not have")]
    MissingSubnetGroup {
        resource: ResourceId,
        subnet_type: SubnetType,
    },

    #[error("Policy {policy} admits any address into {role} group {group}")]
    PublicIngressToPrivateTier {
        policy: ResourceId,
        group: ResourceId,
        role: SegmentRole,
    },

    #[error("{resource} is bound to {group}, a {actual} group; expected a {expected} group")]
    RoleMismatch {
        resource: ResourceId,
        group: ResourceId,
        expected: SegmentRole,
        actual: SegmentRole,
    },

    #[error("{resource} belongs to segment {expected} but references {other} in segment {actual}")]
    CrossSegmentReference {
        resource: ResourceId,
        other: ResourceId,
        expected: ResourceId,
        actual: ResourceId,
    },

    #[error("Fleet min_size {min} exceeds max_size {max}")]
    FleetBounds { min: u32, max: u32 },

    #[error("Fleet min_size must be at least 1")]
    EmptyFleet,

    #[error("Fleet desired capacity {desired} outside {min}..={max}")]
    DesiredCapacityOutOfBounds { desired: u32, min: u32, max: u32 },

    #[error("Allocated storage {allocated} GiB exceeds storage ceiling {max} GiB")]
    StorageBounds { allocated: u32, max: u32 },

    #[error("Allocated storage must be at least 1 GiB")]
    ZeroStorage,

    #[error("Database in {placement} subnets is marked publicly accessible")]
    PubliclyAccessibleDatabase { placement: SubnetType },

    #[error("Database placed in public subnets")]
    DatabaseInPublicSubnets,

    #[error("Invalid engine version: {0:?}")]
    InvalidEngineVersion(String),

    #[error("Credential field name is empty")]
    EmptyFieldName,

    #[error("Generated field {0:?} collides with a fixed field")]
    GeneratedFieldCollision(String),

    #[error("Invalid generation policy: {0}")]
    InvalidGenerationPolicy(String),

    #[error("Credential {credential} is referenced by both {first} and {second}")]
    SharedCredential {
        credential: ResourceId,
        first: ResourceId,
        second: ResourceId,
    },
}

/// Validate the number of availability zones a segment spans
pub fn validate_zone_count(max_azs: u8) -> ValidationResult {
    if max_azs < MIN_AVAILABILITY_ZONES {
        return Err(InvariantViolation::InsufficientAvailabilityZones {
            requested: max_azs,
            minimum: MIN_AVAILABILITY_ZONES,
        });
    }

    if max_azs > MAX_AVAILABILITY_ZONES {
        return Err(InvariantViolation::TooManyAvailabilityZones {
            requested: max_azs,
            maximum: MAX_AVAILABILITY_ZONES,
        });
    }

    Ok(())
}

/// Validate subnet group layout
///
/// # Rules
/// - At least one group, no duplicates
/// - Egress subnets route through NAT gateways that live in public subnets
pub fn validate_subnet_groups(groups: &[SubnetType]) -> ValidationResult {
    if groups.is_empty() {
        return Err(InvariantViolation::NoSubnetGroups);
    }

    for (i, group) in groups.iter().enumerate() {
        if groups[..i].contains(group) {
            return Err(InvariantViolation::DuplicateSubnetGroup(*group));
        }
    }

    if groups.contains(&SubnetType::PrivateWithEgress) && !groups.contains(&SubnetType::Public) {
        return Err(InvariantViolation::EgressWithoutPublicSubnets);
    }

    Ok(())
}

/// Validate a policy source against the role of the group it gates
///
/// Only edge groups may admit arbitrary external addresses.
pub fn validate_policy_source(
    policy: &ResourceId,
    group: &ResourceId,
    role: SegmentRole,
    source: &PolicySource,
) -> ValidationResult {
    if source.is_any_address() && !role.accepts_any_address() {
        return Err(InvariantViolation::PublicIngressToPrivateTier {
            policy: policy.clone(),
            group: group.clone(),
            role,
        });
    }
    Ok(())
}

/// Validate that a resource is bound to a group of the expected role
pub fn validate_group_role(
    resource: &ResourceId,
    group: &ResourceId,
    expected: SegmentRole,
    actual: SegmentRole,
) -> ValidationResult {
    if expected != actual {
        return Err(InvariantViolation::RoleMismatch {
            resource: resource.clone(),
            group: group.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Validate fleet sizing
///
/// # Rules
/// - `1 <= min_size <= max_size`; `min == max` is a fixed-size fleet
/// - Desired capacity, when set, lies within the bounds
pub fn validate_fleet_bounds(min: u32, max: u32, desired: Option<u32>) -> ValidationResult {
    if min == 0 {
        return Err(InvariantViolation::EmptyFleet);
    }

    if min > max {
        return Err(InvariantViolation::FleetBounds { min, max });
    }

    if let Some(desired) = desired {
        if desired < min || desired > max {
            return Err(InvariantViolation::DesiredCapacityOutOfBounds { desired, min, max });
        }
    }

    Ok(())
}

/// Validate database storage
///
/// `allocated == max` disables storage autoscaling and is legal.
pub fn validate_storage_bounds(allocated: u32, max: u32) -> ValidationResult {
    if allocated == 0 {
        return Err(InvariantViolation::ZeroStorage);
    }

    if allocated > max {
        return Err(InvariantViolation::StorageBounds { allocated, max });
    }

    Ok(())
}

/// Validate database exposure
///
/// A database is never publicly accessible and never placed in public subnets.
pub fn validate_database_exposure(
    placement: SubnetType,
    publicly_accessible: bool,
) -> ValidationResult {
    if publicly_accessible {
        return Err(InvariantViolation::PubliclyAccessibleDatabase { placement });
    }

    if placement.is_public() {
        return Err(InvariantViolation::DatabaseInPublicSubnets);
    }

    Ok(())
}

/// Validate an engine version string such as `15.3`
pub fn validate_engine_version(version: &str) -> ValidationResult {
    let valid = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

    if !valid {
        return Err(InvariantViolation::InvalidEngineVersion(version.to_string()));
    }
    Ok(())
}

/// Validate credential field layout
///
/// # Rules
/// - Field names are non-empty
/// - The generated field is not also a fixed field
pub fn validate_credential_fields(
    fixed_fields: &BTreeMap<String, String>,
    generated_field: &str,
) -> ValidationResult {
    if generated_field.is_empty() || fixed_fields.keys().any(|k| k.is_empty()) {
        return Err(InvariantViolation::EmptyFieldName);
    }

    if fixed_fields.contains_key(generated_field) {
        return Err(InvariantViolation::GeneratedFieldCollision(
            generated_field.to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn id(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    #[test_case(0, false ; "zero zones")]
    #[test_case(1, false ; "single zone")]
    #[test_case(2, true ; "two zones")]
    #[test_case(6, true ; "six zones")]
    #[test_case(7, false ; "seven zones")]
    fn test_validate_zone_count(zones: u8, ok: bool) {
        assert_eq!(validate_zone_count(zones).is_ok(), ok);
    }

    #[test]
    fn test_validate_subnet_groups() {
        assert!(
            validate_subnet_groups(&[SubnetType::Public, SubnetType::PrivateWithEgress]).is_ok()
        );
        assert!(validate_subnet_groups(&[SubnetType::PrivateIsolated]).is_ok());

        assert_eq!(
            validate_subnet_groups(&[]),
            Err(InvariantViolation::NoSubnetGroups)
        );
        assert_eq!(
            validate_subnet_groups(&[SubnetType::PrivateWithEgress]),
            Err(InvariantViolation::EgressWithoutPublicSubnets)
        );
        assert_eq!(
            validate_subnet_groups(&[SubnetType::Public, SubnetType::Public]),
            Err(InvariantViolation::DuplicateSubnetGroup(SubnetType::Public))
        );
    }

    #[test]
    fn test_validate_policy_source() {
        let policy = id("P");
        let group = id("G");

        let edge = PolicySource::Group(id("Edge"));

        assert!(
            validate_policy_source(&policy, &group, SegmentRole::Edge, &PolicySource::AnyAddress)
                .is_ok()
        );
        assert!(validate_policy_source(&policy, &group, SegmentRole::Compute, &edge).is_ok());

        for role in [SegmentRole::Compute, SegmentRole::Database] {
            assert!(matches!(
                validate_policy_source(&policy, &group, role, &PolicySource::AnyAddress),
                Err(InvariantViolation::PublicIngressToPrivateTier { .. })
            ));
        }
    }

    #[test_case(2, 4, None, true ; "elastic")]
    #[test_case(3, 3, None, true ; "fixed size")]
    #[test_case(5, 4, None, false ; "min above max")]
    #[test_case(0, 4, None, false ; "empty fleet")]
    #[test_case(2, 4, Some(3), true ; "desired in bounds")]
    #[test_case(2, 4, Some(5), false ; "desired above max")]
    fn test_validate_fleet_bounds(min: u32, max: u32, desired: Option<u32>, ok: bool) {
        assert_eq!(validate_fleet_bounds(min, max, desired).is_ok(), ok);
    }

    #[test]
    fn test_validate_storage_bounds() {
        assert!(validate_storage_bounds(20, 100).is_ok());
        assert!(validate_storage_bounds(20, 20).is_ok());
        assert_eq!(
            validate_storage_bounds(200, 100),
            Err(InvariantViolation::StorageBounds { allocated: 200, max: 100 })
        );
        assert_eq!(validate_storage_bounds(0, 100), Err(InvariantViolation::ZeroStorage));
    }

    #[test]
    fn test_validate_database_exposure() {
        assert!(validate_database_exposure(SubnetType::PrivateWithEgress, false).is_ok());
        assert!(validate_database_exposure(SubnetType::PrivateIsolated, false).is_ok());
        assert!(matches!(
            validate_database_exposure(SubnetType::PrivateWithEgress, true),
            Err(InvariantViolation::PubliclyAccessibleDatabase { .. })
        ));
        assert_eq!(
            validate_database_exposure(SubnetType::Public, true),
            Err(InvariantViolation::PubliclyAccessibleDatabase {
                placement: SubnetType::Public
            })
        );
        assert_eq!(
            validate_database_exposure(SubnetType::Public, false),
            Err(InvariantViolation::DatabaseInPublicSubnets)
        );
    }

    #[test_case("15.3", true ; "major minor")]
    #[test_case("8", true ; "major only")]
    #[test_case("", false ; "empty")]
    #[test_case("15.", false ; "trailing dot")]
    #[test_case("15.x", false ; "non numeric")]
    fn test_validate_engine_version(version: &str, ok: bool) {
        assert_eq!(validate_engine_version(version).is_ok(), ok);
    }

    #[test]
    fn test_validate_credential_fields() {
        let mut fixed = BTreeMap::new();
        fixed.insert("username".to_string(), "dbadmin".to_string());

        assert!(validate_credential_fields(&fixed, "password").is_ok());
        assert_eq!(
            validate_credential_fields(&fixed, "username"),
            Err(InvariantViolation::GeneratedFieldCollision("username".to_string()))
        );
        assert_eq!(
            validate_credential_fields(&fixed, ""),
            Err(InvariantViolation::EmptyFieldName)
        );
    }
}
