// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for three-tier-topology
//!
//! Deterministic environments and props shared by the integration tests.
//! Nothing here reads the process environment.

#![allow(dead_code)]

use std::collections::BTreeMap;

use three_tier_topology::config::{PolicyGapMode, StackEnvironment};
use three_tier_topology::domain::{
    AccessGroupConfig, BalancerConfig, DatabaseConfig, FleetConfig, GenerationPolicy,
    NetworkSegmentConfig, PolicySource, Port, Protocol, ResourceId, SegmentRole,
};
use three_tier_topology::graph::{BuildContext, DeclarationGraph};
use three_tier_topology::stack::{ThreeTierProps, ThreeTierStack};
use three_tier_topology::TopologyResult;

pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "us-east-1";
pub const TEST_STACK: &str = "ThreeTierAppStack";

pub fn environment() -> StackEnvironment {
    StackEnvironment::new(TEST_ACCOUNT, TEST_REGION, TEST_STACK).expect("Invalid test environment")
}

pub fn id(s: &str) -> ResourceId {
    ResourceId::new(s).expect("Invalid resource id in test fixture")
}

pub fn default_props() -> ThreeTierProps {
    ThreeTierProps::default()
}

/// Build the reference stack with the given props
pub fn build(props: &ThreeTierProps, mode: PolicyGapMode) -> TopologyResult<DeclarationGraph> {
    ThreeTierStack::build(environment(), props, mode).map(|stack| stack.graph)
}

/// Build the reference stack with default props, denying policy gaps
pub fn default_graph() -> DeclarationGraph {
    build(&default_props(), PolicyGapMode::Deny).expect("Default stack must build")
}

/// Which ingress policies to declare in [`declare_partial_stack`]
#[derive(Debug, Clone, Copy)]
pub struct Ingress {
    pub edge: bool,
    pub app: bool,
    pub database: bool,
}

impl Ingress {
    pub const ALL: Ingress = Ingress {
        edge: true,
        app: true,
        database: true,
    };
}

/// Declare the three tiers by hand, leaving out selected policies
pub fn declare_partial_stack(ctx: &mut BuildContext, ingress: Ingress) -> TopologyResult<()> {
    let vpc = ctx.network_segment("AppVPC", NetworkSegmentConfig::default())?;

    let edge = ctx.access_group("ALBSG", &vpc, AccessGroupConfig::new(SegmentRole::Edge, "edge"))?;
    let app = ctx.access_group("EC2SG", &vpc, AccessGroupConfig::new(SegmentRole::Compute, "app"))?;
    let db = ctx.access_group("DBSG", &vpc, AccessGroupConfig::new(SegmentRole::Database, "db"))?;

    if ingress.edge {
        ctx.declare_policy(&edge, PolicySource::AnyAddress, Port::HTTP, Protocol::Tcp, "http")?;
    }
    if ingress.app {
        ctx.declare_policy(&app, PolicySource::from(&edge), Port::HTTP, Protocol::Tcp, "http")?;
    }
    if ingress.database {
        ctx.declare_policy(&db, PolicySource::from(&app), Port::POSTGRES, Protocol::Tcp, "pg")?;
    }

    let alb = ctx.create_balancer("AppALB", &vpc, &edge, BalancerConfig::default())?;
    let listener = ctx.add_listener(&alb, Port::HTTP)?;
    let fleet = ctx.create_fleet("AppASG", &vpc, &app, FleetConfig::default())?;
    ctx.register_targets(&listener, &fleet, Port::HTTP)?;

    let mut fixed = BTreeMap::new();
    fixed.insert("username".to_string(), "dbadmin".to_string());
    let secret = ctx.generate_credential(
        "DBCredentialsSecret",
        fixed,
        "password",
        GenerationPolicy::without_punctuation(),
    )?;
    ctx.create_database("AppDB", &vpc, &db, DatabaseConfig::default(), &secret)?;

    Ok(())
}

pub fn context(mode: PolicyGapMode) -> BuildContext {
    BuildContext::new(environment()).with_gap_mode(mode)
}
