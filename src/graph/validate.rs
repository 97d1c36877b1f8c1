// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Validation
//!
//! [`check_declaration`] applies the invariants that involve more than one
//! descriptor (roles, segments, placements, credential sharing) on top of each
//! descriptor's own `validate`. The build context runs it before every insert;
//! [`validate`] runs it again over a whole graph, which is how deserialized
//! graphs get the same guarantees.

use tracing::{debug, warn};

use super::reachability::ReachabilityMatrix;
use super::{DeclarationGraph, Resource};
use crate::domain::invariants::{
    validate_group_role, validate_policy_source, validate_subnet_groups, validate_zone_count,
    InvariantViolation, ValidationResult,
};
use crate::domain::{AccessGroup, ResourceId, SegmentRole, SubnetType};
use crate::config::PolicyGapMode;
use crate::errors::{PolicyGap, TopologyError, TopologyResult};

/// Outcome of validating a complete graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of declarations checked
    pub declarations: usize,
    /// Resources nothing may reach, in declaration order
    pub policy_gaps: Vec<PolicyGap>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.policy_gaps.is_empty()
    }

    /// Apply a gap mode to the collected gaps
    ///
    /// [`PolicyGapMode::Deny`] turns the first gap into an error;
    /// [`PolicyGapMode::Warn`] logs every gap and succeeds.
    pub fn enforce(&self, mode: PolicyGapMode) -> TopologyResult<()> {
        match mode {
            PolicyGapMode::Deny => {
                if let Some(gap) = self.policy_gaps.first() {
                    return Err(TopologyError::PolicyGap(gap.clone()));
                }
            }
            PolicyGapMode::Warn => {
                for gap in &self.policy_gaps {
                    warn!(resource = %gap.resource(), "Policy gap: {}", gap);
                }
            }
        }
        Ok(())
    }
}

/// Validate integrity, invariants and reachability of a graph
///
/// Integrity errors and invariant violations are returned as errors. Policy
/// gaps are collected in the report; whether they are fatal is up to the
/// caller.
pub fn validate(graph: &DeclarationGraph) -> TopologyResult<ValidationReport> {
    graph.verify_integrity()?;

    for declaration in graph.declarations() {
        check_declaration(graph, &declaration.id, &declaration.resource)?;
    }

    let policy_gaps = ReachabilityMatrix::from_graph(graph).policy_gaps(graph);
    debug!(
        declarations = graph.len(),
        gaps = policy_gaps.len(),
        "Validated declaration graph"
    );

    Ok(ValidationReport {
        declarations: graph.len(),
        policy_gaps,
    })
}

/// Check one declaration against the resources it references
///
/// References must already resolve (see
/// [`DeclarationGraph::verify_integrity`]); unresolved ones are skipped here.
pub fn check_declaration(
    graph: &DeclarationGraph,
    id: &ResourceId,
    resource: &Resource,
) -> ValidationResult {
    match resource {
        Resource::NetworkSegment(segment) => {
            let zones = u8::try_from(segment.availability_zones.len()).unwrap_or(u8::MAX);
            validate_zone_count(zones)?;
            validate_subnet_groups(&segment.subnet_types())
        }

        Resource::AccessGroup(_) => Ok(()),

        Resource::AccessPolicy(policy) => {
            let Some(owner) = graph.access_group(&policy.owner) else {
                return Ok(());
            };
            validate_policy_source(id, &policy.owner, owner.role, &policy.source)?;

            if let Some(source_id) = policy.source.group() {
                if let Some(source) = graph.access_group(source_id) {
                    same_segment(id, source_id, &owner.segment, &source.segment)?;
                }
            }
            Ok(())
        }

        Resource::EdgeBalancer(balancer) => {
            bound_group(graph, id, &balancer.group, &balancer.segment, SegmentRole::Edge)?;
            placement_exists(graph, id, &balancer.segment, balancer.placement())
        }

        Resource::Listener(_) => Ok(()),

        Resource::TargetRegistration(registration) => {
            let balancer = graph
                .listener(&registration.listener)
                .and_then(|listener| graph.edge_balancer(&listener.balancer));
            let fleet = graph.compute_fleet(&registration.fleet);

            if let (Some(balancer), Some(fleet)) = (balancer, fleet) {
                same_segment(id, &registration.fleet, &balancer.segment, &fleet.segment)?;
            }
            Ok(())
        }

        Resource::ComputeFleet(fleet) => {
            fleet.validate()?;
            bound_group(graph, id, &fleet.group, &fleet.segment, SegmentRole::Compute)?;
            placement_exists(graph, id, &fleet.segment, fleet.placement)
        }

        Resource::CredentialMaterial(credential) => credential.validate(),

        Resource::ManagedDatabase(database) => {
            database.validate()?;
            bound_group(graph, id, &database.group, &database.segment, SegmentRole::Database)?;
            placement_exists(graph, id, &database.segment, database.placement)?;
            credential_unshared(graph, id, &database.credential)
        }
    }
}

/// The group exists, has the expected role and lives in the same segment
fn bound_group(
    graph: &DeclarationGraph,
    id: &ResourceId,
    group_id: &ResourceId,
    segment: &ResourceId,
    expected: SegmentRole,
) -> ValidationResult {
    let Some(AccessGroup {
        role,
        segment: group_segment,
        ..
    }) = graph.access_group(group_id)
    else {
        return Ok(());
    };

    validate_group_role(id, group_id, expected, *role)?;
    same_segment(id, group_id, segment, group_segment)
}

fn same_segment(
    resource: &ResourceId,
    other: &ResourceId,
    expected: &ResourceId,
    actual: &ResourceId,
) -> ValidationResult {
    if expected != actual {
        return Err(InvariantViolation::CrossSegmentReference {
            resource: resource.clone(),
            other: other.clone(),
            expected: expected.clone(),
            actual: actual.clone(),
        });
    }
    Ok(())
}

fn placement_exists(
    graph: &DeclarationGraph,
    id: &ResourceId,
    segment: &ResourceId,
    subnet_type: SubnetType,
) -> ValidationResult {
    match graph.network_segment(segment) {
        Some(segment) if !segment.has_subnet_type(subnet_type) => {
            Err(InvariantViolation::MissingSubnetGroup {
                resource: id.clone(),
                subnet_type,
            })
        }
        _ => Ok(()),
    }
}

/// At most one database per credential
///
/// Only databases declared earlier are compared, so the error always names the
/// first user of the credential.
fn credential_unshared(
    graph: &DeclarationGraph,
    id: &ResourceId,
    credential: &ResourceId,
) -> ValidationResult {
    let position = graph.position(id);

    let earlier = graph.managed_databases().find(|(other_id, other)| {
        *other_id != id
            && other.credential == *credential
            && match (graph.position(other_id), position) {
                (Some(other_position), Some(position)) => other_position < position,
                _ => true,
            }
    });

    match earlier {
        Some((first, _)) => Err(InvariantViolation::SharedCredential {
            credential: credential.clone(),
            first: first.clone(),
            second: id.clone(),
        }),
        None => Ok(()),
    }
}
