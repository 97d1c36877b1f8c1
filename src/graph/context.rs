// Copyright (c) 2025 - Cowboy AI, Inc.
//! Build Context
//!
//! The context owns the graph under construction. Every declaration goes
//! through the same three steps:
//!
//! 1. References are resolved against earlier declarations
//! 2. Invariants are checked ([`check_declaration`])
//! 3. The descriptor is appended and a typed handle returned
//!
//! A failed declaration leaves the graph unchanged.
//!
//! # Example
//!
//! ```rust
//! use three_tier_topology::config::StackEnvironment;
//! use three_tier_topology::domain::{
//!     AccessGroupConfig, NetworkSegmentConfig, PolicySource, Port, Protocol, SegmentRole,
//! };
//! use three_tier_topology::graph::BuildContext;
//!
//! let mut ctx = BuildContext::new(StackEnvironment::default());
//! let vpc = ctx.network_segment("AppVPC", NetworkSegmentConfig::default()).unwrap();
//! let edge = ctx
//!     .access_group("ALBSG", &vpc, AccessGroupConfig::new(SegmentRole::Edge, "Allow HTTP"))
//!     .unwrap();
//! ctx.declare_policy(&edge, PolicySource::AnyAddress, Port::HTTP, Protocol::Tcp, "Allow HTTP")
//!     .unwrap();
//!
//! let graph = ctx.finalize().unwrap();
//! assert_eq!(graph.len(), 3);
//! ```

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::handles::{
    BalancerHandle, CredentialHandle, DatabaseHandle, FleetHandle, GroupHandle, ListenerHandle,
    PolicyHandle, SegmentHandle,
};
use super::validate::{check_declaration, validate};
use super::{DeclarationGraph, Resource};
use crate::config::{PolicyGapMode, StackEnvironment};
use crate::domain::{
    AccessGroup, AccessGroupConfig, AccessPolicy, BalancerConfig, ComputeFleet, CredentialMaterial,
    DatabaseConfig, EdgeBalancer, FleetConfig, GenerationPolicy, Listener, ManagedDatabase,
    NetworkSegment, NetworkSegmentConfig, PolicySource, Port, Protocol, ResourceId,
    TargetRegistration,
};
use crate::errors::TopologyResult;

/// Explicit builder for a declaration graph
#[derive(Debug, Clone)]
pub struct BuildContext {
    environment: StackEnvironment,
    gap_mode: PolicyGapMode,
    graph: DeclarationGraph,
}

impl BuildContext {
    pub fn new(environment: StackEnvironment) -> Self {
        Self {
            environment,
            gap_mode: PolicyGapMode::default(),
            graph: DeclarationGraph::new(),
        }
    }

    pub fn with_gap_mode(mut self, gap_mode: PolicyGapMode) -> Self {
        self.gap_mode = gap_mode;
        self
    }

    pub fn environment(&self) -> &StackEnvironment {
        &self.environment
    }

    pub fn gap_mode(&self) -> PolicyGapMode {
        self.gap_mode
    }

    /// Graph declared so far
    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    fn declare(&mut self, id: ResourceId, resource: Resource) -> TopologyResult<ResourceId> {
        self.graph.check_references(&id, &resource)?;
        check_declaration(&self.graph, &id, &resource)?;

        debug!("Declared {} {}", resource.kind(), id);
        self.graph.insert(id.clone(), resource)?;
        Ok(id)
    }

    /// Declare a network segment, laying out its subnets in the stack region
    pub fn network_segment(
        &mut self,
        id: impl Into<String>,
        config: NetworkSegmentConfig,
    ) -> TopologyResult<SegmentHandle> {
        let id = ResourceId::new(id)?;
        let segment = NetworkSegment::plan(&config, self.environment.region())?;
        self.declare(id, Resource::NetworkSegment(segment))
            .map(SegmentHandle::new)
    }

    pub fn access_group(
        &mut self,
        id: impl Into<String>,
        segment: &SegmentHandle,
        config: AccessGroupConfig,
    ) -> TopologyResult<GroupHandle> {
        let id = ResourceId::new(id)?;
        let group = AccessGroup::new(segment.id().clone(), config);
        self.declare(id, Resource::AccessGroup(group))
            .map(GroupHandle::new)
    }

    /// Add an ingress policy to `owner`
    ///
    /// The policy id is `{owner}Ingress{n}`, `n` counting the owner's policies
    /// from 1.
    pub fn declare_policy(
        &mut self,
        owner: &GroupHandle,
        source: PolicySource,
        port: Port,
        protocol: Protocol,
        description: impl Into<String>,
    ) -> TopologyResult<PolicyHandle> {
        let n = self.graph.policies_for(owner.id()).count() + 1;
        let id = owner.id().child(format!("Ingress{}", n))?;
        let policy = AccessPolicy {
            owner: owner.id().clone(),
            source,
            port,
            protocol,
            description: description.into(),
        };
        self.declare(id, Resource::AccessPolicy(policy))
            .map(PolicyHandle::new)
    }

    pub fn create_balancer(
        &mut self,
        id: impl Into<String>,
        segment: &SegmentHandle,
        group: &GroupHandle,
        config: BalancerConfig,
    ) -> TopologyResult<BalancerHandle> {
        let id = ResourceId::new(id)?;
        let balancer = EdgeBalancer {
            segment: segment.id().clone(),
            group: group.id().clone(),
            internet_facing: config.internet_facing,
        };
        self.declare(id, Resource::EdgeBalancer(balancer))
            .map(BalancerHandle::new)
    }

    /// Add a TCP listener with id `{balancer}Listener{port}`
    ///
    /// A second listener on the same port is a duplicate identifier.
    pub fn add_listener(
        &mut self,
        balancer: &BalancerHandle,
        port: Port,
    ) -> TopologyResult<ListenerHandle> {
        let id = balancer.id().child(format!("Listener{}", port))?;
        let listener = Listener {
            balancer: balancer.id().clone(),
            port,
            protocol: Protocol::Tcp,
        };
        self.declare(id, Resource::Listener(listener))
            .map(ListenerHandle::new)
    }

    /// Forward traffic from `listener` to `fleet` on `port`
    pub fn register_targets(
        &mut self,
        listener: &ListenerHandle,
        fleet: &FleetHandle,
        port: Port,
    ) -> TopologyResult<()> {
        let id = listener.id().child(format!("Targets{}", fleet.id()))?;
        let registration = TargetRegistration {
            listener: listener.id().clone(),
            fleet: fleet.id().clone(),
            port,
        };
        self.declare(id, Resource::TargetRegistration(registration))?;
        Ok(())
    }

    pub fn create_fleet(
        &mut self,
        id: impl Into<String>,
        segment: &SegmentHandle,
        group: &GroupHandle,
        config: FleetConfig,
    ) -> TopologyResult<FleetHandle> {
        let id = ResourceId::new(id)?;
        let fleet = ComputeFleet::new(segment.id().clone(), group.id().clone(), config);
        self.declare(id, Resource::ComputeFleet(fleet))
            .map(FleetHandle::new)
    }

    /// Declare credential material; the generated value is left to the secret store
    pub fn generate_credential(
        &mut self,
        id: impl Into<String>,
        fixed_fields: BTreeMap<String, String>,
        generated_field: impl Into<String>,
        policy: GenerationPolicy,
    ) -> TopologyResult<CredentialHandle> {
        let id = ResourceId::new(id)?;
        let credential = CredentialMaterial::new(fixed_fields, generated_field, policy);
        self.declare(id, Resource::CredentialMaterial(credential))
            .map(CredentialHandle::new)
    }

    pub fn create_database(
        &mut self,
        id: impl Into<String>,
        segment: &SegmentHandle,
        group: &GroupHandle,
        config: DatabaseConfig,
        credential: &CredentialHandle,
    ) -> TopologyResult<DatabaseHandle> {
        let id = ResourceId::new(id)?;
        let database = ManagedDatabase::new(
            segment.id().clone(),
            group.id().clone(),
            config,
            credential.id().clone(),
        );
        self.declare(id, Resource::ManagedDatabase(database))
            .map(DatabaseHandle::new)
    }

    /// Validate the whole graph and hand it over
    ///
    /// In [`PolicyGapMode::Deny`] the first policy gap is returned as an
    /// error. In [`PolicyGapMode::Warn`] every gap is logged and the graph is
    /// returned.
    pub fn finalize(self) -> TopologyResult<DeclarationGraph> {
        let report = validate(&self.graph)?;
        report.enforce(self.gap_mode)?;

        info!(
            "Finalized declaration graph for {} with {} declarations",
            self.environment, report.declarations
        );
        Ok(self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invariants::InvariantViolation;
    use crate::domain::{ResourceKind, SegmentRole, SubnetType};
    use crate::errors::{GraphIntegrityError, PolicyGap, TopologyError};

    fn context() -> BuildContext {
        BuildContext::new(StackEnvironment::default())
    }

    fn group(
        ctx: &mut BuildContext,
        id: &str,
        vpc: &SegmentHandle,
        role: SegmentRole,
    ) -> GroupHandle {
        ctx.access_group(id, vpc, AccessGroupConfig::new(role, id)).unwrap()
    }

    #[test]
    fn test_policy_ids_count_per_owner() {
        let mut ctx = context();
        let vpc = ctx.network_segment("Vpc", NetworkSegmentConfig::default()).unwrap();
        let edge = group(&mut ctx, "Edge", &vpc, SegmentRole::Edge);

        let first = ctx
            .declare_policy(&edge, PolicySource::AnyAddress, Port::HTTP, Protocol::Tcp, "http")
            .unwrap();
        let second = ctx
            .declare_policy(&edge, PolicySource::AnyAddress, Port::HTTPS, Protocol::Tcp, "https")
            .unwrap();

        assert_eq!(first.id().as_str(), "EdgeIngress1");
        assert_eq!(second.id().as_str(), "EdgeIngress2");
    }

    #[test]
    fn test_any_address_into_compute_rejected_without_mutation() {
        let mut ctx = context();
        let vpc = ctx.network_segment("Vpc", NetworkSegmentConfig::default()).unwrap();
        let app = group(&mut ctx, "App", &vpc, SegmentRole::Compute);
        let before = ctx.graph().len();

        let err = ctx
            .declare_policy(&app, PolicySource::AnyAddress, Port::HTTP, Protocol::Tcp, "open")
            .unwrap_err();

        assert!(matches!(
            err,
            TopologyError::Invariant(InvariantViolation::PublicIngressToPrivateTier { .. })
        ));
        assert_eq!(ctx.graph().len(), before);
    }

    #[test]
    fn test_duplicate_listener_port() {
        let mut ctx = context();
        let vpc = ctx.network_segment("Vpc", NetworkSegmentConfig::default()).unwrap();
        let edge = group(&mut ctx, "Edge", &vpc, SegmentRole::Edge);
        let alb = ctx
            .create_balancer("Alb", &vpc, &edge, BalancerConfig::default())
            .unwrap();

        let listener = ctx.add_listener(&alb, Port::HTTP).unwrap();
        assert_eq!(listener.id().as_str(), "AlbListener80");

        assert!(matches!(
            ctx.add_listener(&alb, Port::HTTP),
            Err(TopologyError::GraphIntegrity(GraphIntegrityError::DuplicateIdentifier(_)))
        ));
    }

    #[test]
    fn test_balancer_requires_edge_group() {
        let mut ctx = context();
        let vpc = ctx.network_segment("Vpc", NetworkSegmentConfig::default()).unwrap();
        let app = group(&mut ctx, "App", &vpc, SegmentRole::Compute);

        assert!(matches!(
            ctx.create_balancer("Alb", &vpc, &app, BalancerConfig::default()),
            Err(TopologyError::Invariant(InvariantViolation::RoleMismatch { .. }))
        ));
    }

    #[test]
    fn test_handle_from_other_context_rejected() {
        let mut other = context();
        let foreign = other.network_segment("Foreign", NetworkSegmentConfig::default()).unwrap();

        let mut ctx = context();
        let err = ctx
            .access_group("Edge", &foreign, AccessGroupConfig::new(SegmentRole::Edge, "edge"))
            .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::GraphIntegrity(GraphIntegrityError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_fleet_placement_must_exist() {
        let mut ctx = context();
        let vpc = ctx
            .network_segment(
                "Vpc",
                NetworkSegmentConfig {
                    subnet_groups: vec![SubnetType::Public, SubnetType::PrivateIsolated],
                    ..Default::default()
                },
            )
            .unwrap();
        let app = group(&mut ctx, "App", &vpc, SegmentRole::Compute);

        assert!(matches!(
            ctx.create_fleet("Fleet", &vpc, &app, FleetConfig::default()),
            Err(TopologyError::Invariant(InvariantViolation::MissingSubnetGroup {
                subnet_type: SubnetType::PrivateWithEgress,
                ..
            }))
        ));
    }

    #[test]
    fn test_finalize_gap_modes() {
        let build = |mode: PolicyGapMode| {
            let mut ctx = context().with_gap_mode(mode);
            let vpc = ctx.network_segment("Vpc", NetworkSegmentConfig::default()).unwrap();
            let edge = group(&mut ctx, "Edge", &vpc, SegmentRole::Edge);
            let alb = ctx
                .create_balancer("Alb", &vpc, &edge, BalancerConfig::default())
                .unwrap();
            ctx.add_listener(&alb, Port::HTTP).unwrap();
            ctx.finalize()
        };

        assert!(matches!(
            build(PolicyGapMode::Deny),
            Err(TopologyError::PolicyGap(PolicyGap::ListenerUnreachable { .. }))
        ));

        let graph = build(PolicyGapMode::Warn).unwrap();
        assert_eq!(graph.count(ResourceKind::Listener), 1);
    }
}
