// Copyright (c) 2025 - Cowboy AI, Inc.
//! Static Reachability Analysis
//!
//! Access policies form a directed graph from sources (any address, or an
//! access group) to the groups that own them. The matrix answers whether a
//! flow is admitted and which declared resources have no admitted path.
//!
//! Default deny: a flow absent from the matrix is not allowed.

use serde::Serialize;

use super::DeclarationGraph;
use crate::domain::{PolicySource, Port, Protocol, ResourceId, SegmentRole};
use crate::errors::PolicyGap;

/// One admitted flow, derived from a single access policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flow {
    pub policy: ResourceId,
    pub source: PolicySource,
    /// Group the traffic is admitted into
    pub target: ResourceId,
    pub port: Port,
    pub protocol: Protocol,
}

impl Flow {
    fn admits(&self, source: &PolicySource, port: Port, protocol: Protocol) -> bool {
        self.port == port
            && self.protocol == protocol
            && (self.source.is_any_address() || self.source == *source)
    }
}

/// Iterator over the flows admitted into one group
#[derive(Debug, Clone)]
pub struct FlowsInto<'a, 'b> {
    flows: std::slice::Iter<'a, Flow>,
    target: &'b ResourceId,
}

impl<'a> Iterator for FlowsInto<'a, '_> {
    type Item = &'a Flow;

    fn next(&mut self) -> Option<&'a Flow> {
        let target = self.target;
        self.flows.find(|flow| flow.target == *target)
    }
}

/// Admitted flows of a declaration graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReachabilityMatrix {
    flows: Vec<Flow>,
}

impl ReachabilityMatrix {
    pub fn from_graph(graph: &DeclarationGraph) -> Self {
        let flows = graph
            .access_policies()
            .map(|(id, policy)| Flow {
                policy: id.clone(),
                source: policy.source.clone(),
                target: policy.owner.clone(),
                port: policy.port,
                protocol: policy.protocol,
            })
            .collect();

        Self { flows }
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Whether any policy admits `source` into `target` on `port`/`protocol`
    pub fn allows(
        &self,
        source: &PolicySource,
        target: &ResourceId,
        port: Port,
        protocol: Protocol,
    ) -> bool {
        self.flows_into(target)
            .any(|flow| flow.admits(source, port, protocol))
    }

    /// Flows admitted into a group
    pub fn flows_into<'a, 'b>(&'a self, target: &'b ResourceId) -> FlowsInto<'a, 'b> {
        FlowsInto {
            flows: self.flows.iter(),
            target,
        }
    }

    /// Sources admitted into a group, in declaration order without repeats
    pub fn sources_for(&self, target: &ResourceId) -> Vec<&PolicySource> {
        let mut sources: Vec<&PolicySource> = Vec::new();
        for flow in self.flows_into(target) {
            if !sources.contains(&&flow.source) {
                sources.push(&flow.source);
            }
        }
        sources
    }

    /// Groups any external address may reach
    pub fn exposed_groups(&self) -> Vec<&ResourceId> {
        let mut groups: Vec<&ResourceId> = Vec::new();
        for flow in self.flows.iter().filter(|f| f.source.is_any_address()) {
            if !groups.contains(&&flow.target) {
                groups.push(&flow.target);
            }
        }
        groups
    }

    /// Declared resources that no policy lets traffic reach
    ///
    /// - An internet-facing listener needs its port open to any address on the
    ///   balancer group; an internal one needs it open to some source.
    /// - Registered targets need the fleet group to admit the balancer group
    ///   on the target port.
    /// - A database needs its group to admit a compute group on its port.
    pub fn policy_gaps(&self, graph: &DeclarationGraph) -> Vec<PolicyGap> {
        let mut gaps = Vec::new();

        for (id, listener) in graph.listeners() {
            let Some(balancer) = graph.edge_balancer(&listener.balancer) else {
                continue;
            };

            let reachable = if balancer.internet_facing {
                self.allows(
                    &PolicySource::AnyAddress,
                    &balancer.group,
                    listener.port,
                    listener.protocol,
                )
            } else {
                self.flows_into(&balancer.group)
                    .any(|f| f.port == listener.port && f.protocol == listener.protocol)
            };

            if !reachable {
                gaps.push(PolicyGap::ListenerUnreachable {
                    listener: id.clone(),
                    balancer: listener.balancer.clone(),
                    group: balancer.group.clone(),
                    port: listener.port,
                });
            }
        }

        for (_, registration) in graph.target_registrations() {
            let Some(listener) = graph.listener(&registration.listener) else {
                continue;
            };
            let (Some(balancer), Some(fleet)) = (
                graph.edge_balancer(&listener.balancer),
                graph.compute_fleet(&registration.fleet),
            ) else {
                continue;
            };

            let source = PolicySource::Group(balancer.group.clone());
            if !self.allows(&source, &fleet.group, registration.port, listener.protocol) {
                gaps.push(PolicyGap::TargetsUnreachable {
                    listener: registration.listener.clone(),
                    fleet: registration.fleet.clone(),
                    group: fleet.group.clone(),
                    port: registration.port,
                });
            }
        }

        for (id, database) in graph.managed_databases() {
            let reachable = self.flows_into(&database.group).any(|flow| {
                flow.port == database.port
                    && flow.protocol == Protocol::Tcp
                    && flow
                        .source
                        .group()
                        .and_then(|group| graph.access_group(group))
                        .is_some_and(|group| group.role == SegmentRole::Compute)
            });

            if !reachable {
                gaps.push(PolicyGap::DatabaseUnreachable {
                    database: id.clone(),
                    group: database.group.clone(),
                    port: database.port,
                });
            }
        }

        gaps
    }
}
