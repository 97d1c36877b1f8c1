// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects and the Network Segment Descriptor
//!
//! The network segment is the root of every topology: one IPv4 address range
//! split into subnet groups that are spread evenly across availability zones.
//! Subnet derivation is deterministic, so the same configuration and region
//! always produce the same subnets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

use super::invariants::{validate_subnet_groups, validate_zone_count};
use crate::errors::TopologyResult;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Address {0} has host bits set for its prefix")]
    MisalignedNetwork(String),

    #[error("Range {cidr} cannot hold {subnets} subnets of at least /{min_prefix}")]
    RangeExhausted {
        cidr: String,
        subnets: usize,
        min_prefix: u8,
    },

    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u16),
}

/// IPv4 network in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - No host bits set below the prefix
///
/// # Examples
///
/// ```rust
/// use three_tier_topology::domain::Ipv4Cidr;
///
/// let cidr = Ipv4Cidr::new("10.0.0.0/16").unwrap();
/// assert_eq!(cidr.prefix_length(), 16);
/// assert!(Ipv4Cidr::new("10.0.0.1/16").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Smallest subnet the provider accepts
    pub const MIN_SUBNET_PREFIX: u8 = 28;

    /// Parse CIDR notation such as `10.0.0.0/16`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        // Invariant: network address only
        if u32::from(address) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::MisalignedNetwork(format!(
                "{}/{}",
                address, prefix_length
            )));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the range
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Whether `other` lies entirely within this range
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.address) & Self::mask(self.prefix_length) == u32::from(self.address)
    }

    /// Split the range into `count` equal blocks
    ///
    /// The block size is the largest power of two that fits `count` blocks,
    /// so trailing space stays unallocated when `count` is not a power of two.
    pub fn subdivide(&self, count: usize) -> Result<Vec<Ipv4Cidr>, NetworkError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let bits = count.next_power_of_two().trailing_zeros();
        let prefix_length = u32::from(self.prefix_length) + bits;
        if prefix_length > u32::from(Self::MIN_SUBNET_PREFIX) {
            return Err(NetworkError::RangeExhausted {
                cidr: self.to_string(),
                subnets: count,
                min_prefix: Self::MIN_SUBNET_PREFIX,
            });
        }

        let step = 1u32 << (32 - prefix_length);
        let base = u32::from(self.address);
        let prefix_length = prefix_length as u8;

        Ok((0..count as u32)
            .map(|i| Ipv4Cidr {
                address: Ipv4Addr::from(base + i * step),
                prefix_length,
            })
            .collect())
    }
}

impl Default for Ipv4Cidr {
    /// Provider default range for a new network segment
    fn default() -> Self {
        Self {
            address: Ipv4Addr::new(10, 0, 0, 0),
            prefix_length: 16,
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Transport port value object
///
/// Port 0 is reserved and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    pub const HTTP: Port = Port(80);
    pub const HTTPS: Port = Port(443);
    pub const MYSQL: Port = Port(3306);
    pub const POSTGRES: Port = Port(5432);

    pub fn new(port: u16) -> Result<Self, NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidPort(port));
        }
        Ok(Self(port))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Transport protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Routing class of a subnet group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Routed through an internet gateway
    Public,
    /// No inbound route; outbound through a NAT gateway
    PrivateWithEgress,
    /// No route outside the segment
    PrivateIsolated,
}

impl SubnetType {
    pub fn is_public(&self) -> bool {
        matches!(self, SubnetType::Public)
    }

    fn name_prefix(&self) -> &'static str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::PrivateWithEgress => "Private",
            SubnetType::PrivateIsolated => "Isolated",
        }
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetType::Public => write!(f, "public"),
            SubnetType::PrivateWithEgress => write!(f, "private_with_egress"),
            SubnetType::PrivateIsolated => write!(f, "private_isolated"),
        }
    }
}

/// One subnet of a network segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub subnet_type: SubnetType,
    pub availability_zone: String,
    pub cidr: Ipv4Cidr,
}

/// Configuration for a network segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSegmentConfig {
    /// Address range (default `10.0.0.0/16`)
    pub cidr: Ipv4Cidr,

    /// Number of availability zones to span (default 2, minimum 2)
    pub max_azs: u8,

    /// Subnet groups laid out in each zone, in allocation order
    /// (default public then private-with-egress)
    pub subnet_groups: Vec<SubnetType>,

    /// NAT gateways for egress subnets (default one per zone)
    pub nat_gateways: Option<u8>,
}

impl Default for NetworkSegmentConfig {
    fn default() -> Self {
        Self {
            cidr: Ipv4Cidr::default(),
            max_azs: 2,
            subnet_groups: vec![SubnetType::Public, SubnetType::PrivateWithEgress],
            nat_gateways: None,
        }
    }
}

/// Network segment descriptor: address range, zones and derived subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSegment {
    pub cidr: Ipv4Cidr,
    pub availability_zones: Vec<String>,
    pub subnets: Vec<Subnet>,
    pub nat_gateways: u8,
}

impl NetworkSegment {
    /// Lay out subnets for `config` in `region`
    ///
    /// # Invariants
    /// - At least two availability zones
    /// - Egress subnets require a public subnet group for their NAT gateways
    /// - The range must hold one block per subnet group per zone
    pub fn plan(config: &NetworkSegmentConfig, region: &str) -> TopologyResult<Self> {
        validate_zone_count(config.max_azs)?;
        validate_subnet_groups(&config.subnet_groups)?;

        let availability_zones = availability_zones(region, config.max_azs);
        let blocks = config
            .cidr
            .subdivide(config.subnet_groups.len() * availability_zones.len())?;

        let subnets = config
            .subnet_groups
            .iter()
            .flat_map(|subnet_type| {
                availability_zones
                    .iter()
                    .enumerate()
                    .map(move |(i, zone)| (*subnet_type, i, zone))
            })
            .zip(blocks)
            .map(|((subnet_type, i, zone), cidr)| Subnet {
                name: format!("{}Subnet{}", subnet_type.name_prefix(), i + 1),
                subnet_type,
                availability_zone: zone.clone(),
                cidr,
            })
            .collect();

        let nat_gateways = if config.subnet_groups.contains(&SubnetType::PrivateWithEgress) {
            config
                .nat_gateways
                .unwrap_or(config.max_azs)
                .clamp(1, config.max_azs)
        } else {
            0
        };

        Ok(Self {
            cidr: config.cidr,
            availability_zones,
            subnets,
            nat_gateways,
        })
    }

    /// Subnets of one routing class
    pub fn subnets_of(&self, subnet_type: SubnetType) -> impl Iterator<Item = &Subnet> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    pub fn has_subnet_type(&self, subnet_type: SubnetType) -> bool {
        self.subnets_of(subnet_type).next().is_some()
    }

    /// Subnet groups present, in allocation order
    pub fn subnet_types(&self) -> Vec<SubnetType> {
        let mut types = Vec::new();
        for subnet in &self.subnets {
            if !types.contains(&subnet.subnet_type) {
                types.push(subnet.subnet_type);
            }
        }
        types
    }
}

/// Zone names for a region: `us-east-1a`, `us-east-1b`, ...
pub fn availability_zones(region: &str, count: u8) -> Vec<String> {
    (b'a'..=b'z')
        .take(usize::from(count))
        .map(|letter| format!("{}{}", region, letter as char))
        .collect()
}
