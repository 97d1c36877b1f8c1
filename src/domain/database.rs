// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Database Descriptor

use serde::{Deserialize, Serialize};
use std::fmt;

use super::instance::{InstanceClass, InstanceShape, InstanceSize};
use super::invariants::{
    validate_database_exposure, validate_engine_version, validate_storage_bounds, ValidationResult,
};
use super::network::{Port, SubnetType};
use super::resource::ResourceId;

/// Relational engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFamily {
    Postgres,
    Mysql,
    MariaDb,
}

impl EngineFamily {
    /// Port the engine listens on unless overridden
    pub fn default_port(&self) -> Port {
        match self {
            EngineFamily::Postgres => Port::POSTGRES,
            EngineFamily::Mysql | EngineFamily::MariaDb => Port::MYSQL,
        }
    }
}

impl fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFamily::Postgres => write!(f, "postgres"),
            EngineFamily::Mysql => write!(f, "mysql"),
            EngineFamily::MariaDb => write!(f, "mariadb"),
        }
    }
}

/// Engine family and version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineSpec {
    pub family: EngineFamily,
    pub version: String,
}

impl EngineSpec {
    pub fn postgres(version: impl Into<String>) -> Self {
        Self {
            family: EngineFamily::Postgres,
            version: version.into(),
        }
    }

    pub fn mysql(version: impl Into<String>) -> Self {
        Self {
            family: EngineFamily::Mysql,
            version: version.into(),
        }
    }
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self::postgres("15.3")
    }
}

impl fmt::Display for EngineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// Storage sizing in GiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Initial allocation (default 20)
    pub allocated_gib: u32,
    /// Ceiling for storage autoscaling (default 100)
    pub max_allocated_gib: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            allocated_gib: 20,
            max_allocated_gib: 100,
        }
    }
}

impl StorageConfig {
    /// Autoscaling is off when the ceiling equals the allocation
    pub fn autoscaling_enabled(&self) -> bool {
        self.max_allocated_gib > self.allocated_gib
    }
}

/// Configuration for a managed database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Subnets the instance is placed in (default private with egress)
    pub placement: SubnetType,
    /// Engine (default postgres 15.3)
    pub engine: EngineSpec,
    /// Instance shape (default `t2.micro`)
    pub shape: InstanceShape,
    pub storage: StorageConfig,
    /// Standby in a second zone (default false)
    pub multi_az: bool,
    /// Must stay false (default false)
    pub publicly_accessible: bool,
    /// Listener port, engine default when unset
    pub port: Option<Port>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            placement: SubnetType::PrivateWithEgress,
            engine: EngineSpec::default(),
            shape: InstanceShape::of(InstanceClass::Burstable2, InstanceSize::Micro),
            storage: StorageConfig::default(),
            multi_az: false,
            publicly_accessible: false,
            port: None,
        }
    }
}

impl DatabaseConfig {
    /// Port the database accepts connections on
    pub fn port(&self) -> Port {
        self.port.unwrap_or_else(|| self.engine.family.default_port())
    }
}

/// Managed database descriptor
///
/// Holds a reference to its credential material, never the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDatabase {
    pub segment: ResourceId,
    pub group: ResourceId,
    pub placement: SubnetType,
    pub engine: EngineSpec,
    pub shape: InstanceShape,
    pub storage: StorageConfig,
    pub multi_az: bool,
    pub publicly_accessible: bool,
    pub port: Port,
    pub credential: ResourceId,
}

impl ManagedDatabase {
    pub fn new(
        segment: ResourceId,
        group: ResourceId,
        config: DatabaseConfig,
        credential: ResourceId,
    ) -> Self {
        let port = config.port();
        Self {
            segment,
            group,
            placement: config.placement,
            engine: config.engine,
            shape: config.shape,
            storage: config.storage,
            multi_az: config.multi_az,
            publicly_accessible: config.publicly_accessible,
            port,
            credential,
        }
    }

    /// Provider instance class, e.g. `db.t2.micro`
    pub fn instance_class(&self) -> String {
        format!("db.{}", self.shape)
    }

    pub fn validate(&self) -> ValidationResult {
        validate_engine_version(&self.engine.version)?;
        validate_storage_bounds(self.storage.allocated_gib, self.storage.max_allocated_gib)?;
        validate_database_exposure(self.placement, self.publicly_accessible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invariants::InvariantViolation;

    fn database(config: DatabaseConfig) -> ManagedDatabase {
        ManagedDatabase::new(
            ResourceId::new("AppVPC").unwrap(),
            ResourceId::new("DBSG").unwrap(),
            config,
            ResourceId::new("DBCredentialsSecret").unwrap(),
        )
    }

    #[test]
    fn test_default_database() {
        let db = database(DatabaseConfig::default());
        assert_eq!(db.engine.to_string(), "postgres 15.3");
        assert_eq!(db.port, Port::POSTGRES);
        assert_eq!(db.instance_class(), "db.t2.micro");
        assert!(!db.publicly_accessible);
        assert!(!db.multi_az);
        assert!(db.storage.autoscaling_enabled());
        assert!(db.validate().is_ok());
    }

    #[test]
    fn test_engine_default_ports() {
        let db = database(DatabaseConfig {
            engine: EngineSpec::mysql("8.0"),
            ..Default::default()
        });
        assert_eq!(db.port, Port::MYSQL);

        let custom = database(DatabaseConfig {
            port: Some(Port::new(6543).unwrap()),
            ..Default::default()
        });
        assert_eq!(custom.port.value(), 6543);
    }

    #[test]
    fn test_equal_storage_disables_autoscaling() {
        let db = database(DatabaseConfig {
            storage: StorageConfig {
                allocated_gib: 50,
                max_allocated_gib: 50,
            },
            ..Default::default()
        });
        assert!(!db.storage.autoscaling_enabled());
        assert!(db.validate().is_ok());
    }

    #[test]
    fn test_public_flag_rejected() {
        let db = database(DatabaseConfig {
            publicly_accessible: true,
            ..Default::default()
        });
        assert!(matches!(
            db.validate(),
            Err(InvariantViolation::PubliclyAccessibleDatabase { .. })
        ));
    }
}
