// Copyright (c) 2025 - Cowboy AI, Inc.
//! Credential Material Descriptor
//!
//! Describes a secret with fixed fields and one generated field. The secret
//! store generates the value; this crate only records the field layout and the
//! exclusion rules the generated value must satisfy. No secret value is ever
//! held by a descriptor, so none can reach a serialized graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::invariants::{validate_credential_fields, InvariantViolation, ValidationResult};

/// Character-class rules for the generated field
///
/// The candidate alphabet is printable ASCII (`!` through `~`), plus space when
/// `include_space` is set, minus every excluded character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPolicy {
    /// Exclude ASCII punctuation
    pub exclude_punctuation: bool,
    /// Additional characters to exclude
    pub exclude_characters: String,
    /// Allow the space character
    pub include_space: bool,
    /// Generated length (default 32)
    pub length: u16,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            exclude_punctuation: false,
            exclude_characters: String::new(),
            include_space: false,
            length: 32,
        }
    }
}

impl GenerationPolicy {
    /// Policy excluding punctuation, otherwise default
    pub fn without_punctuation() -> Self {
        Self {
            exclude_punctuation: true,
            ..Self::default()
        }
    }

    /// Whether `c` may appear in a generated value
    pub fn permits(&self, c: char) -> bool {
        let in_alphabet = c.is_ascii_graphic() || (c == ' ' && self.include_space);
        in_alphabet
            && !(self.exclude_punctuation && c.is_ascii_punctuation())
            && !self.exclude_characters.contains(c)
    }

    /// Whether `candidate` satisfies the length and exclusion rules
    pub fn satisfies(&self, candidate: &str) -> bool {
        candidate.chars().count() == usize::from(self.length)
            && candidate.chars().all(|c| self.permits(c))
    }

    /// Every character a generated value may contain
    pub fn alphabet(&self) -> Vec<char> {
        (' '..='~').filter(|c| self.permits(*c)).collect()
    }

    pub fn validate(&self) -> ValidationResult {
        if self.length == 0 {
            return Err(InvariantViolation::InvalidGenerationPolicy(
                "length must be at least 1".to_string(),
            ));
        }

        if self.alphabet().is_empty() {
            return Err(InvariantViolation::InvalidGenerationPolicy(
                "every character is excluded".to_string(),
            ));
        }

        Ok(())
    }
}

/// Credential material descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMaterial {
    /// Fields with author-supplied values (e.g. `username`)
    pub fixed_fields: BTreeMap<String, String>,
    /// Field the secret store fills in (e.g. `password`)
    pub generated_field: String,
    pub policy: GenerationPolicy,
}

impl CredentialMaterial {
    pub fn new(
        fixed_fields: BTreeMap<String, String>,
        generated_field: impl Into<String>,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            fixed_fields,
            generated_field: generated_field.into(),
            policy,
        }
    }

    /// JSON template of the fixed fields handed to the secret store
    pub fn secret_string_template(&self) -> String {
        let fields = self
            .fixed_fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(fields).to_string()
    }

    /// All field names the stored secret exposes
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fixed_fields
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(self.generated_field.as_str()))
    }

    pub fn validate(&self) -> ValidationResult {
        validate_credential_fields(&self.fixed_fields, &self.generated_field)?;
        self.policy.validate()
    }
}
