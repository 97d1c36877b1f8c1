// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration Graph
//!
//! The graph is an arena of resource descriptors keyed by [`ResourceId`].
//! Declarations are kept in the order they were made and every reference must
//! point to an earlier declaration, so insertion order is a topological order
//! and cycles cannot exist.
//!
//! # Lifecycle
//!
//! 1. A [`BuildContext`] declares resources one by one, checking references
//!    and invariants as it goes.
//! 2. [`BuildContext::finalize`] runs the full [`validate`] pass and yields an
//!    immutable [`DeclarationGraph`].
//! 3. The graph is serialized and handed to an external orchestrator.

pub mod context;
pub mod handles;
pub mod reachability;
pub mod validate;

pub use context::BuildContext;
pub use handles::{
    BalancerHandle, CredentialHandle, DatabaseHandle, FleetHandle, GroupHandle, ListenerHandle,
    PolicyHandle, SegmentHandle,
};
pub use reachability::{Flow, FlowsInto, ReachabilityMatrix};
pub use validate::{validate, ValidationReport};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{
    AccessGroup, AccessPolicy, ComputeFleet, CredentialMaterial, EdgeBalancer, Listener,
    ManagedDatabase, NetworkSegment, PolicySource, ResourceId, ResourceKind, TargetRegistration,
};
use crate::errors::{GraphIntegrityError, TopologyResult};

/// Version of the serialized graph layout
pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// A resource descriptor of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum Resource {
    NetworkSegment(NetworkSegment),
    AccessGroup(AccessGroup),
    AccessPolicy(AccessPolicy),
    EdgeBalancer(EdgeBalancer),
    Listener(Listener),
    TargetRegistration(TargetRegistration),
    ComputeFleet(ComputeFleet),
    CredentialMaterial(CredentialMaterial),
    ManagedDatabase(ManagedDatabase),
}

/// One outgoing reference of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Field holding the reference
    pub field: &'static str,
    pub target: &'a ResourceId,
    pub expected: ResourceKind,
}

impl<'a> Reference<'a> {
    fn new(field: &'static str, target: &'a ResourceId, expected: ResourceKind) -> Self {
        Self {
            field,
            target,
            expected,
        }
    }
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::NetworkSegment(_) => ResourceKind::NetworkSegment,
            Resource::AccessGroup(_) => ResourceKind::AccessGroup,
            Resource::AccessPolicy(_) => ResourceKind::AccessPolicy,
            Resource::EdgeBalancer(_) => ResourceKind::EdgeBalancer,
            Resource::Listener(_) => ResourceKind::Listener,
            Resource::TargetRegistration(_) => ResourceKind::TargetRegistration,
            Resource::ComputeFleet(_) => ResourceKind::ComputeFleet,
            Resource::CredentialMaterial(_) => ResourceKind::CredentialMaterial,
            Resource::ManagedDatabase(_) => ResourceKind::ManagedDatabase,
        }
    }

    /// Outgoing references, with the kind each must resolve to
    pub fn references(&self) -> Vec<Reference<'_>> {
        use ResourceKind as K;

        match self {
            Resource::NetworkSegment(_) | Resource::CredentialMaterial(_) => Vec::new(),
            Resource::AccessGroup(g) => {
                vec![Reference::new("segment", &g.segment, K::NetworkSegment)]
            }
            Resource::AccessPolicy(p) => {
                let mut refs = vec![Reference::new("owner", &p.owner, K::AccessGroup)];
                if let PolicySource::Group(source) = &p.source {
                    refs.push(Reference::new("source", source, K::AccessGroup));
                }
                refs
            }
            Resource::EdgeBalancer(b) => vec![
                Reference::new("segment", &b.segment, K::NetworkSegment),
                Reference::new("group", &b.group, K::AccessGroup),
            ],
            Resource::Listener(l) => vec![Reference::new("balancer", &l.balancer, K::EdgeBalancer)],
            Resource::TargetRegistration(t) => vec![
                Reference::new("listener", &t.listener, K::Listener),
                Reference::new("fleet", &t.fleet, K::ComputeFleet),
            ],
            Resource::ComputeFleet(f) => vec![
                Reference::new("segment", &f.segment, K::NetworkSegment),
                Reference::new("group", &f.group, K::AccessGroup),
            ],
            Resource::ManagedDatabase(d) => vec![
                Reference::new("segment", &d.segment, K::NetworkSegment),
                Reference::new("group", &d.group, K::AccessGroup),
                Reference::new("credential", &d.credential, K::CredentialMaterial),
            ],
        }
    }

    pub fn as_network_segment(&self) -> Option<&NetworkSegment> {
        match self {
            Resource::NetworkSegment(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_access_group(&self) -> Option<&AccessGroup> {
        match self {
            Resource::AccessGroup(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_access_policy(&self) -> Option<&AccessPolicy> {
        match self {
            Resource::AccessPolicy(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_edge_balancer(&self) -> Option<&EdgeBalancer> {
        match self {
            Resource::EdgeBalancer(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Resource::Listener(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_target_registration(&self) -> Option<&TargetRegistration> {
        match self {
            Resource::TargetRegistration(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_compute_fleet(&self) -> Option<&ComputeFleet> {
        match self {
            Resource::ComputeFleet(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_credential_material(&self) -> Option<&CredentialMaterial> {
        match self {
            Resource::CredentialMaterial(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_managed_database(&self) -> Option<&ManagedDatabase> {
        match self {
            Resource::ManagedDatabase(r) => Some(r),
            _ => None,
        }
    }
}

/// A descriptor together with its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: ResourceId,
    pub resource: Resource,
}

/// Serialized form of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphDocument {
    format_version: u32,
    resources: Vec<Declaration>,
}

/// Acyclic arena of resource declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct DeclarationGraph {
    declarations: Vec<Declaration>,
    index: HashMap<ResourceId, usize>,
}

impl PartialEq for DeclarationGraph {
    fn eq(&self, other: &Self) -> bool {
        self.declarations == other.declarations
    }
}

impl Eq for DeclarationGraph {}

impl DeclarationGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from declarations, checking integrity
    pub fn from_declarations(declarations: Vec<Declaration>) -> Result<Self, GraphIntegrityError> {
        let mut index = HashMap::with_capacity(declarations.len());
        for (position, declaration) in declarations.iter().enumerate() {
            if index.insert(declaration.id.clone(), position).is_some() {
                return Err(GraphIntegrityError::DuplicateIdentifier(declaration.id.clone()));
            }
        }

        let graph = Self {
            declarations,
            index,
        };
        graph.verify_integrity()?;
        Ok(graph)
    }

    /// Check every reference against declaration order and kind
    pub fn verify_integrity(&self) -> Result<(), GraphIntegrityError> {
        for (position, declaration) in self.declarations.iter().enumerate() {
            self.check_references_at(&declaration.id, &declaration.resource, position)?;
        }
        Ok(())
    }

    /// Check that `resource` could be appended under `id`
    pub(crate) fn check_references(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> Result<(), GraphIntegrityError> {
        if self.index.contains_key(id) {
            return Err(GraphIntegrityError::DuplicateIdentifier(id.clone()));
        }
        self.check_references_at(id, resource, self.declarations.len())
    }

    fn check_references_at(
        &self,
        id: &ResourceId,
        resource: &Resource,
        position: usize,
    ) -> Result<(), GraphIntegrityError> {
        for reference in resource.references() {
            let target_position = self.index.get(reference.target).copied().ok_or_else(|| {
                GraphIntegrityError::UnknownReference {
                    from: id.clone(),
                    field: reference.field.to_string(),
                    to: reference.target.clone(),
                }
            })?;

            if target_position >= position {
                return Err(GraphIntegrityError::ForwardReference {
                    from: id.clone(),
                    field: reference.field.to_string(),
                    to: reference.target.clone(),
                });
            }

            let actual = self.declarations[target_position].resource.kind();
            if actual != reference.expected {
                return Err(GraphIntegrityError::KindMismatch {
                    from: id.clone(),
                    field: reference.field.to_string(),
                    to: reference.target.clone(),
                    expected: reference.expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Append a declaration after checking its references
    pub(crate) fn insert(
        &mut self,
        id: ResourceId,
        resource: Resource,
    ) -> Result<(), GraphIntegrityError> {
        self.check_references(&id, &resource)?;
        self.index.insert(id.clone(), self.declarations.len());
        self.declarations.push(Declaration { id, resource });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.declarations[i].resource)
    }

    /// Position in declaration order
    pub fn position(&self, id: &ResourceId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Declarations in dependency order, leaves first
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn resources(&self) -> impl Iterator<Item = (&ResourceId, &Resource)> {
        self.declarations.iter().map(|d| (&d.id, &d.resource))
    }

    /// Identifiers in an order that satisfies every reference
    pub fn dependency_order(&self) -> Vec<&ResourceId> {
        self.declarations.iter().map(|d| &d.id).collect()
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.resource.kind() == kind)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Outgoing references of a declaration
    pub fn references(&self, id: &ResourceId) -> Option<Vec<Reference<'_>>> {
        self.get(id).map(Resource::references)
    }

    /// Declarations that reference `id`
    pub fn dependents(&self, id: &ResourceId) -> Vec<&ResourceId> {
        self.declarations
            .iter()
            .filter(|d| d.resource.references().iter().any(|r| r.target == id))
            .map(|d| &d.id)
            .collect()
    }

    pub fn network_segment(&self, id: &ResourceId) -> Option<&NetworkSegment> {
        self.get(id).and_then(Resource::as_network_segment)
    }

    pub fn access_group(&self, id: &ResourceId) -> Option<&AccessGroup> {
        self.get(id).and_then(Resource::as_access_group)
    }

    pub fn edge_balancer(&self, id: &ResourceId) -> Option<&EdgeBalancer> {
        self.get(id).and_then(Resource::as_edge_balancer)
    }

    pub fn listener(&self, id: &ResourceId) -> Option<&Listener> {
        self.get(id).and_then(Resource::as_listener)
    }

    pub fn compute_fleet(&self, id: &ResourceId) -> Option<&ComputeFleet> {
        self.get(id).and_then(Resource::as_compute_fleet)
    }

    pub fn credential_material(&self, id: &ResourceId) -> Option<&CredentialMaterial> {
        self.get(id).and_then(Resource::as_credential_material)
    }

    pub fn managed_database(&self, id: &ResourceId) -> Option<&ManagedDatabase> {
        self.get(id).and_then(Resource::as_managed_database)
    }

    pub fn access_groups(&self) -> impl Iterator<Item = (&ResourceId, &AccessGroup)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_access_group().map(|r| (&d.id, r)))
    }

    pub fn access_policies(&self) -> impl Iterator<Item = (&ResourceId, &AccessPolicy)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_access_policy().map(|r| (&d.id, r)))
    }

    pub fn listeners(&self) -> impl Iterator<Item = (&ResourceId, &Listener)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_listener().map(|r| (&d.id, r)))
    }

    pub fn target_registrations(&self) -> impl Iterator<Item = (&ResourceId, &TargetRegistration)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_target_registration().map(|r| (&d.id, r)))
    }

    pub fn compute_fleets(&self) -> impl Iterator<Item = (&ResourceId, &ComputeFleet)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_compute_fleet().map(|r| (&d.id, r)))
    }

    pub fn managed_databases(&self) -> impl Iterator<Item = (&ResourceId, &ManagedDatabase)> {
        self.declarations
            .iter()
            .filter_map(|d| d.resource.as_managed_database().map(|r| (&d.id, r)))
    }

    /// Policies owned by a group
    pub fn policies_for(
        &self,
        group: &ResourceId,
    ) -> impl Iterator<Item = (&ResourceId, &AccessPolicy)> {
        let group = group.clone();
        self.access_policies()
            .filter(move |(_, policy)| policy.owner == group)
    }

    pub fn to_json(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a serialized graph, keeping integrity errors typed
    pub fn from_json(json: &str) -> TopologyResult<Self> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Ok(Self::try_from(document)?)
    }
}

impl TryFrom<GraphDocument> for DeclarationGraph {
    type Error = GraphIntegrityError;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        if document.format_version != GRAPH_FORMAT_VERSION {
            return Err(GraphIntegrityError::UnsupportedFormatVersion {
                found: document.format_version,
                expected: GRAPH_FORMAT_VERSION,
            });
        }
        Self::from_declarations(document.resources)
    }
}

impl From<DeclarationGraph> for GraphDocument {
    fn from(graph: DeclarationGraph) -> Self {
        Self {
            format_version: GRAPH_FORMAT_VERSION,
            resources: graph.declarations,
        }
    }
}
