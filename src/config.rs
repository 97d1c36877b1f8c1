// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack environment and synthesis configuration
//!
//! Account, region and stack name are read from the environment, with
//! defaults that reproduce the reference deployment target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Configuration validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid account id {0:?} (must be 12 digits)")]
    InvalidAccount(String),

    #[error("Invalid region {0:?} (expected e.g. us-east-1)")]
    InvalidRegion(String),

    #[error("Invalid stack name {0:?} (letter first, then letters, digits or hyphens, max 128)")]
    InvalidStackName(String),

    #[error("Invalid policy gap mode {0:?} (expected deny or warn)")]
    InvalidGapMode(String),
}

/// Deployment target of a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEnvironment")]
pub struct StackEnvironment {
    account: String,
    region: String,
    stack_name: String,
}

/// Unvalidated wire form of [`StackEnvironment`]
#[derive(Deserialize)]
struct RawEnvironment {
    account: String,
    region: String,
    stack_name: String,
}

impl TryFrom<RawEnvironment> for StackEnvironment {
    type Error = ConfigError;

    fn try_from(raw: RawEnvironment) -> Result<Self, Self::Error> {
        Self::new(raw.account, raw.region, raw.stack_name)
    }
}

impl StackEnvironment {
    pub const DEFAULT_ACCOUNT: &'static str = "123456789012";
    pub const DEFAULT_REGION: &'static str = "us-east-1";
    pub const DEFAULT_STACK_NAME: &'static str = "ThreeTierAppStack";

    /// Create an environment with validation
    pub fn new(
        account: impl Into<String>,
        region: impl Into<String>,
        stack_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let account = account.into();
        let region = region.into();
        let stack_name = stack_name.into();

        if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidAccount(account));
        }

        if !is_valid_region(&region) {
            return Err(ConfigError::InvalidRegion(region));
        }

        if !is_valid_stack_name(&stack_name) {
            return Err(ConfigError::InvalidStackName(stack_name));
        }

        Ok(Self {
            account,
            region,
            stack_name,
        })
    }

    /// Load from `STACK_ACCOUNT`, `STACK_REGION` and `STACK_NAME`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup("STACK_ACCOUNT").unwrap_or_else(|| Self::DEFAULT_ACCOUNT.to_string()),
            lookup("STACK_REGION").unwrap_or_else(|| Self::DEFAULT_REGION.to_string()),
            lookup("STACK_NAME").unwrap_or_else(|| Self::DEFAULT_STACK_NAME.to_string()),
        )
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Deterministic stack identifier (UUID v5 over account, region and name)
    pub fn stack_id(&self) -> Uuid {
        let name = format!("stack://{}/{}/{}", self.account, self.region, self.stack_name);
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    }
}

impl Default for StackEnvironment {
    fn default() -> Self {
        Self {
            account: Self::DEFAULT_ACCOUNT.to_string(),
            region: Self::DEFAULT_REGION.to_string(),
            stack_name: Self::DEFAULT_STACK_NAME.to_string(),
        }
    }
}

impl fmt::Display for StackEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.stack_name, self.account, self.region)
    }
}

fn is_valid_region(region: &str) -> bool {
    let is_part = |p: &&str| {
        !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    };

    let parts: Vec<&str> = region.split('-').collect();
    parts.len() >= 3
        && parts.iter().all(is_part)
        && parts
            .last()
            .is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()))
}

fn is_valid_stack_name(name: &str) -> bool {
    name.len() <= 128
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// How policy gaps found at finalization are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyGapMode {
    /// Abort on the first gap
    #[default]
    Deny,
    /// Log each gap and continue
    Warn,
}

impl FromStr for PolicyGapMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(PolicyGapMode::Deny),
            "warn" => Ok(PolicyGapMode::Warn),
            _ => Err(ConfigError::InvalidGapMode(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyGapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyGapMode::Deny => write!(f, "deny"),
            PolicyGapMode::Warn => write!(f, "warn"),
        }
    }
}

/// Configuration for a synthesis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub environment: StackEnvironment,
    pub gap_mode: PolicyGapMode,
    /// Manifest destination; stdout when unset
    pub output: Option<PathBuf>,
    /// JSON file overriding the default stack properties
    pub props: Option<PathBuf>,
}

impl SynthConfig {
    /// Load from the environment
    ///
    /// Reads the [`StackEnvironment`] variables plus `POLICY_GAP_MODE`,
    /// `SYNTH_OUTPUT` and `STACK_PROPS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = StackEnvironment::from_lookup(&lookup)?;
        let gap_mode = lookup("POLICY_GAP_MODE")
            .map(|mode| mode.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            environment,
            gap_mode,
            output: lookup("SYNTH_OUTPUT").map(PathBuf::from),
            props: lookup("STACK_PROPS").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let env = StackEnvironment::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env, StackEnvironment::default());
        assert_eq!(env.account(), "123456789012");
        assert_eq!(env.region(), "us-east-1");
        assert_eq!(env.stack_name(), "ThreeTierAppStack");
    }

    #[test]
    fn test_overrides() {
        let config = SynthConfig::from_lookup(lookup(&[
            ("STACK_ACCOUNT", "210987654321"),
            ("STACK_REGION", "eu-west-2"),
            ("POLICY_GAP_MODE", "warn"),
            ("SYNTH_OUTPUT", "out/manifest.json"),
        ]))
        .unwrap();

        assert_eq!(config.environment.account(), "210987654321");
        assert_eq!(config.environment.region(), "eu-west-2");
        assert_eq!(config.gap_mode, PolicyGapMode::Warn);
        assert_eq!(config.output, Some(PathBuf::from("out/manifest.json")));
        assert_eq!(config.props, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            StackEnvironment::new("1234", "us-east-1", "Stack"),
            Err(ConfigError::InvalidAccount(_))
        ));
        assert!(matches!(
            StackEnvironment::new("123456789012", "useast1", "Stack"),
            Err(ConfigError::InvalidRegion(_))
        ));
        assert!(matches!(
            StackEnvironment::new("123456789012", "us-east-1", "my stack"),
            Err(ConfigError::InvalidStackName(_))
        ));
        assert!(matches!(
            SynthConfig::from_lookup(lookup(&[("POLICY_GAP_MODE", "ignore")])),
            Err(ConfigError::InvalidGapMode(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"account":"210987654321","region":"eu-west-2","stack_name":"Shop"}"#;
        let env: StackEnvironment = serde_json::from_str(json).unwrap();
        assert_eq!(env.region(), "eu-west-2");

        let json = r#"{"account":"12","region":"us-east-1","stack_name":"Shop"}"#;
        assert!(serde_json::from_str::<StackEnvironment>(json).is_err());
    }

    #[test]
    fn test_stack_id_is_deterministic() {
        let a = StackEnvironment::default();
        let b = StackEnvironment::default();
        assert_eq!(a.stack_id(), b.stack_id());

        let other =
            StackEnvironment::new("123456789012", "us-west-2", "ThreeTierAppStack").unwrap();
        assert_ne!(a.stack_id(), other.stack_id());
    }
}
