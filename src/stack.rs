// Copyright (c) 2025 - Cowboy AI, Inc.
//! Three-Tier Application Stack
//!
//! Declares the reference topology: one network segment, an internet-facing
//! balancer, an elastic compute fleet behind it and a private PostgreSQL
//! database reachable only from the fleet.
//!
//! ```text
//! any address --80--> ALBSG (AppALB) --80--> EC2SG (AppASG) --5432--> DBSG (AppDB)
//! ```
//!
//! Every constant lives in [`ThreeTierProps`], whose `Default` reproduces the
//! reference deployment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{PolicyGapMode, StackEnvironment};
use crate::domain::{
    AccessGroupConfig, BalancerConfig, DatabaseConfig, FleetConfig, GenerationPolicy,
    NetworkSegmentConfig, PolicySource, Port, Protocol, SegmentRole,
};
use crate::errors::TopologyResult;
use crate::graph::{
    BalancerHandle, BuildContext, CredentialHandle, DatabaseHandle, DeclarationGraph, FleetHandle,
    GroupHandle, ListenerHandle, SegmentHandle,
};

/// Database credential layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialProps {
    /// Fixed `username` field (default `dbadmin`)
    pub username: String,
    /// Field the secret store generates (default `password`)
    pub generated_field: String,
    /// Default excludes punctuation
    pub policy: GenerationPolicy,
}

impl Default for CredentialProps {
    fn default() -> Self {
        Self {
            username: "dbadmin".to_string(),
            generated_field: "password".to_string(),
            policy: GenerationPolicy::without_punctuation(),
        }
    }
}

/// Tunable constants of the three-tier topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeTierProps {
    pub network: NetworkSegmentConfig,
    pub balancer: BalancerConfig,
    /// Listener and target port (default 80)
    pub http_port: Port,
    pub fleet: FleetConfig,
    pub credential: CredentialProps,
    pub database: DatabaseConfig,
}

impl Default for ThreeTierProps {
    fn default() -> Self {
        Self {
            network: NetworkSegmentConfig::default(),
            balancer: BalancerConfig::default(),
            http_port: Port::HTTP,
            fleet: FleetConfig::default(),
            credential: CredentialProps::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Handles to every resource of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreeTierHandles {
    pub vpc: SegmentHandle,
    pub alb_group: GroupHandle,
    pub app_group: GroupHandle,
    pub db_group: GroupHandle,
    pub balancer: BalancerHandle,
    pub listener: ListenerHandle,
    pub fleet: FleetHandle,
    pub credential: CredentialHandle,
    pub database: DatabaseHandle,
}

/// A finalized three-tier stack
#[derive(Debug, Clone)]
pub struct ThreeTierStack {
    pub handles: ThreeTierHandles,
    pub graph: DeclarationGraph,
}

impl ThreeTierStack {
    pub const VPC: &'static str = "AppVPC";
    pub const ALB_GROUP: &'static str = "ALBSG";
    pub const APP_GROUP: &'static str = "EC2SG";
    pub const DB_GROUP: &'static str = "DBSG";
    pub const BALANCER: &'static str = "AppALB";
    pub const FLEET: &'static str = "AppASG";
    pub const CREDENTIAL: &'static str = "DBCredentialsSecret";
    pub const DATABASE: &'static str = "AppDB";

    /// Declare the topology into an existing context
    pub fn declare(
        ctx: &mut BuildContext,
        props: &ThreeTierProps,
    ) -> TopologyResult<ThreeTierHandles> {
        let vpc = ctx.network_segment(Self::VPC, props.network.clone())?;

        let alb_group = ctx.access_group(
            Self::ALB_GROUP,
            &vpc,
            AccessGroupConfig::new(SegmentRole::Edge, "Allow HTTP"),
        )?;
        ctx.declare_policy(
            &alb_group,
            PolicySource::AnyAddress,
            props.http_port,
            Protocol::Tcp,
            "Allow HTTP",
        )?;

        let app_group = ctx.access_group(
            Self::APP_GROUP,
            &vpc,
            AccessGroupConfig::new(SegmentRole::Compute, "Allow HTTP from ALB"),
        )?;
        ctx.declare_policy(
            &app_group,
            PolicySource::from(&alb_group),
            props.http_port,
            Protocol::Tcp,
            "Allow HTTP from ALB",
        )?;

        let db_group = ctx.access_group(
            Self::DB_GROUP,
            &vpc,
            AccessGroupConfig::new(SegmentRole::Database, "Allow PostgreSQL from EC2"),
        )?;
        ctx.declare_policy(
            &db_group,
            PolicySource::from(&app_group),
            props.database.port(),
            Protocol::Tcp,
            "Allow PostgreSQL",
        )?;

        let balancer =
            ctx.create_balancer(Self::BALANCER, &vpc, &alb_group, props.balancer.clone())?;
        let listener = ctx.add_listener(&balancer, props.http_port)?;

        let fleet = ctx.create_fleet(Self::FLEET, &vpc, &app_group, props.fleet.clone())?;
        ctx.register_targets(&listener, &fleet, props.http_port)?;

        let mut fixed_fields = BTreeMap::new();
        fixed_fields.insert("username".to_string(), props.credential.username.clone());
        let credential = ctx.generate_credential(
            Self::CREDENTIAL,
            fixed_fields,
            props.credential.generated_field.clone(),
            props.credential.policy.clone(),
        )?;

        let database = ctx.create_database(
            Self::DATABASE,
            &vpc,
            &db_group,
            props.database.clone(),
            &credential,
        )?;

        Ok(ThreeTierHandles {
            vpc,
            alb_group,
            app_group,
            db_group,
            balancer,
            listener,
            fleet,
            credential,
            database,
        })
    }

    /// Declare and finalize the topology in a fresh context
    pub fn build(
        environment: StackEnvironment,
        props: &ThreeTierProps,
        gap_mode: PolicyGapMode,
    ) -> TopologyResult<Self> {
        info!("Declaring three-tier stack {}", environment);

        let mut ctx = BuildContext::new(environment).with_gap_mode(gap_mode);
        let handles = Self::declare(&mut ctx, props)?;
        let graph = ctx.finalize()?;

        Ok(Self { handles, graph })
    }
}
