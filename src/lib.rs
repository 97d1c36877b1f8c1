// Copyright (c) 2025 - Cowboy AI, Inc.
//! Three-tier cloud topology declarations
//!
//! Declares a network segment, an edge balancer, a compute fleet and a managed
//! database as an acyclic graph of typed descriptors. The graph is validated
//! (references, structural invariants, reachability) and serialized for an
//! external orchestrator to materialize.
//!
//! ```rust
//! use three_tier_topology::config::{PolicyGapMode, StackEnvironment};
//! use three_tier_topology::stack::{ThreeTierProps, ThreeTierStack};
//!
//! let stack = ThreeTierStack::build(
//!     StackEnvironment::default(),
//!     &ThreeTierProps::default(),
//!     PolicyGapMode::Deny,
//! )
//! .unwrap();
//! assert_eq!(stack.graph.len(), 13);
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod stack;
pub mod synth;

// Re-export commonly used types
pub use config::{ConfigError, PolicyGapMode, StackEnvironment, SynthConfig};
pub use errors::{GraphIntegrityError, ManifestError, PolicyGap, TopologyError, TopologyResult};
pub use graph::{BuildContext, DeclarationGraph, Resource, ValidationReport};
pub use stack::{ThreeTierProps, ThreeTierStack};
pub use synth::{synthesize, Manifest};
