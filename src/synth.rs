// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synthesis
//!
//! Builds the three-tier stack for an environment and wraps the finalized
//! graph in a [`Manifest`], the JSON document handed to an orchestrator.
//! The timestamp lives on the manifest only; the graph itself is
//! deterministic for a given environment and props.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::{PolicyGapMode, StackEnvironment};
use crate::domain::ResourceId;
use crate::errors::{ManifestError, TopologyResult};
use crate::graph::{validate, DeclarationGraph, ReachabilityMatrix};
use crate::stack::{ThreeTierProps, ThreeTierStack};

/// Version of the manifest layout
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Synthesized stack, ready for handoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    /// UUID v5 of account, region and stack name
    pub stack_id: Uuid,
    pub environment: StackEnvironment,
    pub synthesized_at: DateTime<Utc>,
    /// Groups reachable from any address
    pub exposed_groups: Vec<ResourceId>,
    pub graph: DeclarationGraph,
}

impl Manifest {
    pub fn new(environment: StackEnvironment, graph: DeclarationGraph) -> Self {
        let exposed_groups = exposed_groups(&graph);

        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            stack_id: environment.stack_id(),
            environment,
            synthesized_at: Utc::now(),
            exposed_groups,
            graph,
        }
    }

    pub fn to_json_pretty(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest, rejecting any policy gap in its graph
    pub fn from_json(json: &str) -> TopologyResult<Self> {
        Self::from_json_with_mode(json, PolicyGapMode::Deny)
    }

    /// Parse a manifest and re-validate it
    ///
    /// The graph gets the full [`validate`] pass with gaps handled per
    /// `gap_mode`. The header must agree with the graph: a known format
    /// version, the stack id of its environment, and the groups the graph
    /// actually exposes.
    pub fn from_json_with_mode(json: &str, gap_mode: PolicyGapMode) -> TopologyResult<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;

        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return Err(ManifestError::UnsupportedFormatVersion {
                found: manifest.format_version,
                expected: MANIFEST_FORMAT_VERSION,
            }
            .into());
        }

        let expected = manifest.environment.stack_id();
        if manifest.stack_id != expected {
            return Err(ManifestError::StackIdMismatch {
                found: manifest.stack_id,
                expected,
            }
            .into());
        }

        validate(&manifest.graph)?.enforce(gap_mode)?;

        let derived = exposed_groups(&manifest.graph);
        if manifest.exposed_groups != derived {
            return Err(ManifestError::ExposureMismatch {
                declared: manifest.exposed_groups,
                derived,
            }
            .into());
        }

        Ok(manifest)
    }
}

fn exposed_groups(graph: &DeclarationGraph) -> Vec<ResourceId> {
    ReachabilityMatrix::from_graph(graph)
        .exposed_groups()
        .into_iter()
        .cloned()
        .collect()
}

/// Build and finalize the three-tier stack, then wrap it in a manifest
pub fn synthesize(
    environment: &StackEnvironment,
    props: &ThreeTierProps,
    gap_mode: PolicyGapMode,
) -> TopologyResult<Manifest> {
    let stack = ThreeTierStack::build(environment.clone(), props, gap_mode)?;
    let manifest = Manifest::new(environment.clone(), stack.graph);

    info!(
        "Synthesized stack {} ({} declarations)",
        manifest.stack_id,
        manifest.graph.len()
    );
    Ok(manifest)
}
