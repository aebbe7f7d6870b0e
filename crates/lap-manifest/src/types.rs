//! Service record data model
//!
//! This module provides:
//! - `InterfaceDecl` / `InstanceBinding`: the raw element lists pulled out of one manifest
//! - `ServiceRecord`: the unified record produced by reconciliation
//! - `SafetyLevel` / `ServiceCategory` / `Version`: the typed record attributes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport binding assumed when an instance does not name one
pub const DEFAULT_BINDING: &str = "iceoryx2";

/// Prefix of the endpoint derived for instances without an explicit endpoint
pub const DEFAULT_ENDPOINT_PREFIX: &str = "/lap";

/// Prefix of the names given to instances whose interface reference is empty
pub const PLACEHOLDER_PREFIX: &str = "UnknownService_";

/// Name tokens (lower-case) that classify a service as ASIL-D
const SAFETY_TOKENS: &[&str] = &["control", "safety"];

// =============================================================================
// MANIFEST ELEMENTS - what the reader extracts, nothing more
// =============================================================================

/// A service interface declaration (`*SERVICE-INTERFACE`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceDecl {
    /// SHORT-NAME; empty when the element has none
    pub name: String,
    pub major_version: Option<u32>,
    pub minor_version: Option<u32>,
    pub description: Option<String>,
}

/// A provided or required service instance binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceBinding {
    pub instance_id: Option<u32>,
    /// Last path segment of SERVICE-INTERFACE-REF; empty when absent
    pub service_ref: String,
    /// Lower-cased connector type
    pub binding: Option<String>,
    pub endpoint: Option<String>,
}

/// Everything extracted from one manifest document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDocument {
    /// Label used in diagnostics, usually the file path
    pub source: String,
    pub interfaces: Vec<InterfaceDecl>,
    pub instances: Vec<InstanceBinding>,
}

impl ManifestDocument {
    pub fn new(source: impl Into<String>) -> Self {
        ManifestDocument {
            source: source.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// SERVICE RECORD
// =============================================================================

/// Safety classification of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyLevel {
    #[default]
    #[serde(rename = "QM")]
    Qm,
    #[serde(rename = "ASIL-D")]
    AsilD,
}

impl SafetyLevel {
    /// Classify a service by its name: any safety token (case-insensitive) makes it ASIL-D
    pub fn classify(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if SAFETY_TOKENS.iter().any(|token| lowered.contains(token)) {
            SafetyLevel::AsilD
        } else {
            SafetyLevel::Qm
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Qm => "QM",
            SafetyLevel::AsilD => "ASIL-D",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nominal allocation category of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Static,
    #[default]
    Dynamic,
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceCategory::Static => f.write_str("static"),
            ServiceCategory::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Interface version, rendered as `<major>.<minor>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Version { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version { major: 1, minor: 0 }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("Invalid version '{}': expected <major>.<minor>", s))?;
        let major = major
            .parse()
            .map_err(|_| format!("Invalid major version in '{}'", s))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("Invalid minor version in '{}'", s))?;
        Ok(Version { major, minor })
    }
}

/// One service instance after reconciliation
///
/// Created by the reconciler, then enriched in place: identity first, slot last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    /// 32-bit service identity; zero means "not yet derived"
    pub identity: u32,
    pub instance_id: u32,
    pub version: Version,
    pub binding: String,
    pub endpoint: String,
    pub safety_level: SafetyLevel,
    pub category: ServiceCategory,
    /// Empty when the interface carries no description
    pub description: String,
    /// Explicit slot requested by upstream configuration
    pub slot_hint: Option<u16>,
    /// Assigned registry slot, set by the allocator
    pub slot: Option<u16>,
}

impl ServiceRecord {
    /// A record with every field at its default, named `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ServiceRecord {
            identity: 0,
            instance_id: 0,
            version: Version::default(),
            binding: DEFAULT_BINDING.to_string(),
            endpoint: default_endpoint(&name),
            safety_level: SafetyLevel::classify(&name),
            category: ServiceCategory::default(),
            description: String::new(),
            slot_hint: None,
            slot: None,
            name,
        }
    }
}

/// Endpoint path used when an instance does not declare one
pub fn default_endpoint(name: &str) -> String {
    format!("{}/{}", DEFAULT_ENDPOINT_PREFIX, name)
}

/// Name given to an unresolvable instance with an empty reference
pub fn placeholder_name(ordinal: usize) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_classification() {
        assert_eq!(SafetyLevel::classify("BrakeControl"), SafetyLevel::AsilD);
        assert_eq!(SafetyLevel::classify("SAFETYMonitor"), SafetyLevel::AsilD);
        assert_eq!(SafetyLevel::classify("cruise_control_v2"), SafetyLevel::AsilD);
        assert_eq!(SafetyLevel::classify("RadarService"), SafetyLevel::Qm);
        assert_eq!(SafetyLevel::classify(""), SafetyLevel::Qm);
    }

    #[test]
    fn test_version_display_and_parse() {
        let version = Version::new(2, 13);
        assert_eq!(version.to_string(), "2.13");
        assert_eq!("2.13".parse::<Version>(), Ok(version));
        assert_eq!(Version::default().to_string(), "1.0");
        assert!("2".parse::<Version>().is_err());
        assert!("a.b".parse::<Version>().is_err());
    }

    #[test]
    fn test_record_defaults() {
        let record = ServiceRecord::new("RadarService");
        assert_eq!(record.binding, "iceoryx2");
        assert_eq!(record.endpoint, "/lap/RadarService");
        assert_eq!(record.version, Version::new(1, 0));
        assert_eq!(record.category, ServiceCategory::Dynamic);
        assert_eq!(record.safety_level, SafetyLevel::Qm);
        assert!(record.slot.is_none());
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_name(7), "UnknownService_7");
    }
}
