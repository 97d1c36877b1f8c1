// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Generated topologies exercise segmentation, capacity bounds, determinism
//! and serialization of the declaration graph.

mod topology_invariants;
