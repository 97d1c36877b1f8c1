// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance Shapes and Machine Images

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceShapeError {
    #[error("Instance shape must be <class>.<size>: {0}")]
    InvalidFormat(String),

    #[error("Invalid character in instance shape: {0:?}")]
    InvalidCharacter(char),
}

/// Instance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceClass {
    Burstable2,
    Burstable3,
    Burstable3Amd,
    Burstable4Graviton,
    Standard5,
    Compute5,
    Memory5,
}

impl InstanceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceClass::Burstable2 => "t2",
            InstanceClass::Burstable3 => "t3",
            InstanceClass::Burstable3Amd => "t3a",
            InstanceClass::Burstable4Graviton => "t4g",
            InstanceClass::Standard5 => "m5",
            InstanceClass::Compute5 => "c5",
            InstanceClass::Memory5 => "r5",
        }
    }
}

/// Instance size within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
}

impl InstanceSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceSize::Nano => "nano",
            InstanceSize::Micro => "micro",
            InstanceSize::Small => "small",
            InstanceSize::Medium => "medium",
            InstanceSize::Large => "large",
            InstanceSize::Xlarge => "xlarge",
        }
    }
}

/// Instance shape such as `t3.micro`
///
/// Invariants:
/// - Exactly one `.` separating a non-empty class and size
/// - Lowercase ASCII letters and digits only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceShape(String);

impl InstanceShape {
    pub fn new(shape: impl Into<String>) -> Result<Self, InstanceShapeError> {
        let shape = shape.into();

        if let Some(c) = shape
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.'))
        {
            return Err(InstanceShapeError::InvalidCharacter(c));
        }

        match shape.split_once('.') {
            Some((class, size)) if !class.is_empty() && !size.is_empty() && !size.contains('.') => {
                Ok(Self(shape))
            }
            _ => Err(InstanceShapeError::InvalidFormat(shape)),
        }
    }

    /// Compose a shape from class and size
    pub fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self(format!("{}.{}", class.as_str(), size.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn class(&self) -> &str {
        self.0.split_once('.').map(|(class, _)| class).unwrap_or(&self.0)
    }
}

impl fmt::Display for InstanceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceShape {
    type Err = InstanceShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstanceShape {
    type Error = InstanceShapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstanceShape> for String {
    fn from(shape: InstanceShape) -> Self {
        shape.0
    }
}

/// Image instances boot from
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineImage {
    /// Latest Amazon Linux, resolved by the orchestrator
    #[default]
    AmazonLinux,
    AmazonLinux2023,
    /// Explicit image identifier
    Custom(String),
}
