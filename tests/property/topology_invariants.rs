// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Generated Topologies
//!
//! Each case declares a segment, three groups with fixed roles, a random set
//! of ingress policies and a balancer, fleet and database with random sizing.
//! Declarations the invariants reject are skipped; whatever graph survives
//! finalization must satisfy every structural property.

use std::collections::BTreeMap;

use proptest::prelude::*;
use three_tier_topology::config::{PolicyGapMode, StackEnvironment};
use three_tier_topology::domain::{
    AccessGroupConfig, BalancerConfig, DatabaseConfig, FleetConfig, GenerationPolicy,
    NetworkSegmentConfig, PolicySource, Port, Protocol, SegmentRole, StorageConfig,
};
use three_tier_topology::graph::{BuildContext, DeclarationGraph, GroupHandle};
use three_tier_topology::{TopologyError, TopologyResult};

// ============================================================================
// Generated Topology Plan
// ============================================================================

const ROLES: [SegmentRole; 3] = [SegmentRole::Edge, SegmentRole::Compute, SegmentRole::Database];
const GROUP_IDS: [&str; 3] = ["Edge", "App", "Data"];

#[derive(Debug, Clone)]
struct PolicyPlan {
    owner: usize,
    /// `None` is any address
    source: Option<usize>,
    port: u16,
}

#[derive(Debug, Clone)]
struct TopologyPlan {
    zones: u8,
    internet_facing: bool,
    policies: Vec<PolicyPlan>,
    min_size: u32,
    max_size: u32,
    allocated_gib: u32,
    max_allocated_gib: u32,
    publicly_accessible: bool,
}

/// Outcome of one generated policy declaration
#[derive(Debug)]
struct PolicyOutcome {
    plan: PolicyPlan,
    accepted: bool,
}

fn declare(
    plan: &TopologyPlan,
    outcomes: &mut Vec<PolicyOutcome>,
) -> TopologyResult<DeclarationGraph> {
    let mut ctx = BuildContext::new(StackEnvironment::default()).with_gap_mode(PolicyGapMode::Warn);

    let vpc = ctx.network_segment(
        "Vpc",
        NetworkSegmentConfig {
            max_azs: plan.zones,
            ..Default::default()
        },
    )?;

    let groups = ROLES
        .iter()
        .zip(GROUP_IDS)
        .map(|(role, id)| ctx.access_group(id, &vpc, AccessGroupConfig::new(*role, id)))
        .collect::<TopologyResult<Vec<GroupHandle>>>()?;

    for policy in &plan.policies {
        let source = match policy.source {
            Some(i) => PolicySource::from(&groups[i]),
            None => PolicySource::AnyAddress,
        };
        let port = Port::new(policy.port)?;
        let result =
            ctx.declare_policy(&groups[policy.owner], source, port, Protocol::Tcp, "generated");
        outcomes.push(PolicyOutcome {
            plan: policy.clone(),
            accepted: result.is_ok(),
        });
    }

    let balancer = ctx.create_balancer(
        "Alb",
        &vpc,
        &groups[0],
        BalancerConfig {
            internet_facing: plan.internet_facing,
        },
    )?;
    let listener = ctx.add_listener(&balancer, Port::HTTP)?;

    let fleet = ctx.create_fleet(
        "Fleet",
        &vpc,
        &groups[1],
        FleetConfig {
            min_size: plan.min_size,
            max_size: plan.max_size,
            ..Default::default()
        },
    )?;
    ctx.register_targets(&listener, &fleet, Port::HTTP)?;

    let mut fixed = BTreeMap::new();
    fixed.insert("username".to_string(), "dbadmin".to_string());
    let secret = ctx.generate_credential("Secret", fixed, "password", GenerationPolicy::default())?;

    ctx.create_database(
        "Db",
        &vpc,
        &groups[2],
        DatabaseConfig {
            storage: StorageConfig {
                allocated_gib: plan.allocated_gib,
                max_allocated_gib: plan.max_allocated_gib,
            },
            publicly_accessible: plan.publicly_accessible,
            ..Default::default()
        },
        &secret,
    )?;

    ctx.finalize()
}

fn build(plan: &TopologyPlan) -> (Vec<PolicyOutcome>, TopologyResult<DeclarationGraph>) {
    let mut outcomes = Vec::new();
    let result = declare(plan, &mut outcomes);
    (outcomes, result)
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn policy_plan() -> impl Strategy<Value = PolicyPlan> {
    (
        0usize..3,
        prop::option::of(0usize..3),
        prop::sample::select(vec![80u16, 443, 5432, 8080]),
    )
        .prop_map(|(owner, source, port)| PolicyPlan {
            owner,
            source,
            port,
        })
}

fn topology_plan() -> impl Strategy<Value = TopologyPlan> {
    (
        1u8..=7,
        any::<bool>(),
        prop::collection::vec(policy_plan(), 0..12),
        (0u32..6, 0u32..6),
        (0u32..150, 0u32..150),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(zones, internet_facing, policies, sizes, storage, public)| TopologyPlan {
            zones,
            internet_facing,
            policies,
            min_size: sizes.0,
            max_size: sizes.1,
            allocated_gib: storage.0,
            max_allocated_gib: storage.1,
            publicly_accessible: public,
        })
}

fn describe(result: &TopologyResult<DeclarationGraph>) -> Result<String, String> {
    match result {
        Ok(graph) => graph.to_json().map_err(|e| e.to_string()),
        Err(err) => Err(err.to_string()),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: any-address ingress is only ever accepted into edge groups
    #[test]
    fn prop_open_ingress_only_into_edge(plan in topology_plan()) {
        let (outcomes, result) = build(&plan);

        for outcome in &outcomes {
            if outcome.plan.source.is_none() && outcome.plan.owner != 0 {
                prop_assert!(
                    !outcome.accepted,
                    "Open ingress accepted into {:?}",
                    ROLES[outcome.plan.owner]
                );
            }
        }

        if let Ok(graph) = result {
            for (id, policy) in graph.access_policies() {
                let owner = graph.access_group(&policy.owner).expect("owner resolves");
                prop_assert!(
                    !policy.source.is_any_address() || owner.role == SegmentRole::Edge,
                    "{} admits any address into a {} group", id, owner.role
                );
            }
        }
    }

    /// Property: surviving fleets and databases respect their bounds
    #[test]
    fn prop_capacity_bounds_hold(plan in topology_plan()) {
        let (_, result) = build(&plan);

        let bounds_valid = plan.min_size >= 1
            && plan.min_size <= plan.max_size
            && plan.allocated_gib >= 1
            && plan.allocated_gib <= plan.max_allocated_gib;

        match result {
            Ok(graph) => {
                prop_assert!(bounds_valid);
                for (_, fleet) in graph.compute_fleets() {
                    prop_assert!(1 <= fleet.min_size && fleet.min_size <= fleet.max_size);
                }
                for (_, db) in graph.managed_databases() {
                    prop_assert!(db.storage.allocated_gib <= db.storage.max_allocated_gib);
                    prop_assert!(!db.publicly_accessible);
                }
            }
            Err(TopologyError::Invariant(_)) => {}
            Err(other) => {
                prop_assert!(false, "Unexpected error: {}", other);
            }
        }
    }

    /// Property: identical inputs produce identical graphs
    #[test]
    fn prop_construction_is_deterministic(plan in topology_plan()) {
        let (_, first) = build(&plan);
        let (_, second) = build(&plan);
        prop_assert_eq!(describe(&first), describe(&second));
    }

    /// Property: a finalized graph survives serialization unchanged
    #[test]
    fn prop_graph_round_trips(plan in topology_plan()) {
        let (_, result) = build(&plan);

        if let Ok(graph) = result {
            let json = graph.to_json().expect("serializable");
            let parsed = DeclarationGraph::from_json(&json).expect("parseable");
            prop_assert_eq!(&parsed, &graph);
            prop_assert_eq!(parsed.dependency_order(), graph.dependency_order());
        }
    }

    /// Property: every reference points to an earlier declaration
    #[test]
    fn prop_references_point_backwards(plan in topology_plan()) {
        let (_, result) = build(&plan);

        if let Ok(graph) = result {
            for (position, declaration) in graph.declarations().iter().enumerate() {
                for reference in declaration.resource.references() {
                    let target = graph.position(reference.target).expect("reference resolves");
                    prop_assert!(target < position);
                }
            }
        }
    }
}
