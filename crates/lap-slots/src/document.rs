//! Slot configuration document
//!
//! Serde model of the configuration consumed by the registry initializer. Field
//! order matches the emitted order so that regenerated files diff cleanly. On read,
//! a missing bucket means zero entries for that pool.

use crate::errors::DocumentError;
use crate::pools::{Pool, MAX_SLOT, STATIC_SLOT_END, TOTAL_SLOTS};
use lap_manifest::{parse_permissive_int, SafetyLevel, ServiceCategory, ServiceRecord, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Version tag of the document layout
pub const FORMAT_VERSION: &str = "1.0";

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub const VARIANTS: [&'static str; 2] = ["yaml", "json"];

    /// `.json` files are JSON, everything else YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown format '{}' (expected one of: {})",
                other,
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Top-level slot configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfigDocument {
    pub version: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub slot_mapping: SlotMapping,
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_by: String,
    pub source: String,
    pub date: String,
    pub total_services: usize,
}

/// The three allocation buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMapping {
    #[serde(default)]
    pub static_allocations: Vec<SlotEntry>,
    #[serde(default)]
    pub dynamic_allocations: Vec<SlotEntry>,
    #[serde(default)]
    pub asil_allocations: Vec<SlotEntry>,
}

/// One allocated service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub slot_index: u16,
    pub service_name: String,
    /// `0x` followed by eight upper-case hex digits
    pub service_id: String,
    pub instance_id: u32,
    /// `<major>.<minor>`
    pub version: String,
    pub binding: String,
    pub endpoint: String,
    pub safety_level: SafetyLevel,
    #[serde(default)]
    pub category: ServiceCategory,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub total_slots: u16,
    pub static_range: String,
    pub dynamic_range: String,
    pub asil_range: String,
    pub enable_hugepages: bool,
    pub enable_guard_pages: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            total_slots: TOTAL_SLOTS,
            static_range: Pool::Static.range_string(),
            dynamic_range: Pool::Dynamic.range_string(),
            asil_range: Pool::Asil.range_string(),
            enable_hugepages: true,
            enable_guard_pages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_crc32_check: bool,
    pub enable_exec_whitelist: bool,
    pub qm_asil_separation: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            enable_crc32_check: true,
            enable_exec_whitelist: true,
            qm_asil_separation: true,
        }
    }
}

// =============================================================================
// ENTRY <-> RECORD
// =============================================================================

/// Render an identity the way the registry expects it
pub fn format_service_id(identity: u32) -> String {
    format!("0x{:08X}", identity)
}

impl SlotEntry {
    pub fn from_record(record: &ServiceRecord, slot: u16) -> Self {
        SlotEntry {
            slot_index: slot,
            service_name: record.name.clone(),
            service_id: format_service_id(record.identity),
            instance_id: record.instance_id,
            version: record.version.to_string(),
            binding: record.binding.clone(),
            endpoint: record.endpoint.clone(),
            safety_level: record.safety_level,
            category: record.category,
            description: record.description.clone(),
        }
    }

    /// Rebuild the allocated record this entry was projected from
    pub fn to_record(&self) -> Result<ServiceRecord, DocumentError> {
        let identity =
            parse_permissive_int(&self.service_id).ok_or_else(|| DocumentError::InvalidEntry {
                service: self.service_name.clone(),
                reason: format!("invalid service_id '{}'", self.service_id),
            })?;
        let version = Version::from_str(&self.version).map_err(|reason| {
            DocumentError::InvalidEntry {
                service: self.service_name.clone(),
                reason,
            }
        })?;

        Ok(ServiceRecord {
            name: self.service_name.clone(),
            identity,
            instance_id: self.instance_id,
            version,
            binding: self.binding.clone(),
            endpoint: self.endpoint.clone(),
            safety_level: self.safety_level,
            category: self.category,
            description: self.description.clone(),
            slot_hint: None,
            slot: Some(self.slot_index),
        })
    }
}

// =============================================================================
// AUDIT
// =============================================================================

/// Bucket names as they appear under `slot_mapping`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Static,
    Dynamic,
    Asil,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Static => f.write_str("static_allocations"),
            Bucket::Dynamic => f.write_str("dynamic_allocations"),
            Bucket::Asil => f.write_str("asil_allocations"),
        }
    }
}

/// A consumer-side inconsistency found in a loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditFinding {
    SlotOutOfRange { service: String, slot: u16 },
    AsilOutsidePool { service: String, slot: u16 },
    QmInAsilPool { service: String, slot: u16 },
    WrongBucket { service: String, bucket: Bucket },
    DuplicateSlot { slot: u16, services: Vec<String> },
    CountMismatch { declared: usize, actual: usize },
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditFinding::SlotOutOfRange { service, slot } => {
                write!(f, "{}: slot {} is outside 0-{}", service, slot, MAX_SLOT)
            }
            AuditFinding::AsilOutsidePool { service, slot } => write!(
                f,
                "{}: ASIL-D service in slot {} outside {}",
                service,
                slot,
                Pool::Asil.range_string()
            ),
            AuditFinding::QmInAsilPool { service, slot } => {
                write!(f, "{}: QM service occupies ASIL-D slot {}", service, slot)
            }
            AuditFinding::WrongBucket { service, bucket } => {
                write!(f, "{}: listed under {} but does not belong there", service, bucket)
            }
            AuditFinding::DuplicateSlot { slot, services } => {
                write!(f, "slot {} is shared by {}", slot, services.join(", "))
            }
            AuditFinding::CountMismatch { declared, actual } => write!(
                f,
                "metadata declares {} services but {} entries are present",
                declared, actual
            ),
        }
    }
}

// =============================================================================
// DOCUMENT OPERATIONS
// =============================================================================

impl SlotConfigDocument {
    /// All entries in bucket order: static, dynamic, ASIL-D
    pub fn entries(&self) -> impl Iterator<Item = (Bucket, &SlotEntry)> {
        let mapping = &self.slot_mapping;
        mapping
            .static_allocations
            .iter()
            .map(|entry| (Bucket::Static, entry))
            .chain(
                mapping
                    .dynamic_allocations
                    .iter()
                    .map(|entry| (Bucket::Dynamic, entry)),
            )
            .chain(
                mapping
                    .asil_allocations
                    .iter()
                    .map(|entry| (Bucket::Asil, entry)),
            )
    }

    pub fn entry_count(&self) -> usize {
        self.slot_mapping.static_allocations.len()
            + self.slot_mapping.dynamic_allocations.len()
            + self.slot_mapping.asil_allocations.len()
    }

    /// Reconstruct every record, in bucket order
    pub fn records(&self) -> Result<Vec<ServiceRecord>, DocumentError> {
        self.entries().map(|(_, entry)| entry.to_record()).collect()
    }

    /// Check the invariants the registry relies on; findings are reported, not raised
    pub fn audit(&self) -> Vec<AuditFinding> {
        let mut findings = Vec::new();
        let mut by_slot: BTreeMap<u16, Vec<String>> = BTreeMap::new();

        for (bucket, entry) in self.entries() {
            let service = entry.service_name.clone();
            let slot = entry.slot_index;
            by_slot.entry(slot).or_default().push(service.clone());

            if slot > MAX_SLOT {
                findings.push(AuditFinding::SlotOutOfRange { service, slot });
                continue;
            }

            let in_asil_pool = Pool::Asil.contains(slot);
            match entry.safety_level {
                SafetyLevel::AsilD if !in_asil_pool => {
                    findings.push(AuditFinding::AsilOutsidePool {
                        service: service.clone(),
                        slot,
                    });
                }
                SafetyLevel::Qm if in_asil_pool => {
                    findings.push(AuditFinding::QmInAsilPool {
                        service: service.clone(),
                        slot,
                    });
                }
                _ => {}
            }

            if bucket != expected_bucket(entry.safety_level, slot) {
                findings.push(AuditFinding::WrongBucket { service, bucket });
            }
        }

        for (slot, services) in by_slot {
            if services.len() > 1 {
                findings.push(AuditFinding::DuplicateSlot { slot, services });
            }
        }

        let actual = self.entry_count();
        if self.metadata.total_services != actual {
            findings.push(AuditFinding::CountMismatch {
                declared: self.metadata.total_services,
                actual,
            });
        }

        findings
    }

    pub fn to_string_as(&self, format: OutputFormat) -> Result<String, DocumentError> {
        match format {
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
        }
    }

    pub fn from_str_as(text: &str, format: OutputFormat) -> Result<Self, DocumentError> {
        match format {
            OutputFormat::Yaml => Ok(serde_yaml::from_str(text)?),
            OutputFormat::Json => Ok(serde_json::from_str(text)?),
        }
    }

    /// Load a document, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        debug!("Reading slot configuration: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_str_as(&content, OutputFormat::from_path(path))
    }

    /// Save with atomic write: serialize, write a temp file, rename
    pub fn save(&self, path: &Path, format: OutputFormat) -> Result<(), DocumentError> {
        let content = self.to_string_as(format)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        {
            let file = fs::File::create(&temp_path)?;
            let mut writer = std::io::BufWriter::new(file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;

        info!(
            "Slot configuration written to {:?} ({} services)",
            path,
            self.entry_count()
        );
        Ok(())
    }
}

/// Bucket an entry belongs in: ASIL-D by safety level, otherwise by slot value
pub fn expected_bucket(safety_level: SafetyLevel, slot: u16) -> Bucket {
    if safety_level == SafetyLevel::AsilD {
        Bucket::Asil
    } else if slot <= STATIC_SLOT_END {
        Bucket::Static
    } else {
        Bucket::Dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, slot: u16, safety_level: SafetyLevel) -> SlotEntry {
        let mut record = ServiceRecord::new(name);
        record.identity = lap_manifest::derive_identity(name);
        record.safety_level = safety_level;
        SlotEntry::from_record(&record, slot)
    }

    fn document(mapping: SlotMapping) -> SlotConfigDocument {
        let total = mapping.static_allocations.len()
            + mapping.dynamic_allocations.len()
            + mapping.asil_allocations.len();
        SlotConfigDocument {
            version: FORMAT_VERSION.to_string(),
            metadata: Metadata {
                generated_by: "lap-slotgen".to_string(),
                source: "AUTOSAR ARXML".to_string(),
                date: "2025-11-19".to_string(),
                total_services: total,
            },
            slot_mapping: mapping,
            system_config: SystemConfig::default(),
            security: SecurityConfig::default(),
        }
    }

    #[test]
    fn test_format_service_id() {
        assert_eq!(format_service_id(0x1234), "0x00001234");
        assert_eq!(format_service_id(0xf4fc_8135), "0xF4FC8135");
    }

    #[test]
    fn test_entry_round_trip() {
        let mut record = ServiceRecord::new("RadarService");
        record.identity = 0xad38_1fbe;
        record.instance_id = 3;
        record.version = Version::new(2, 1);
        record.binding = "someip".to_string();
        record.category = ServiceCategory::Static;
        record.description = "Front radar".to_string();
        record.slot = Some(110);

        let entry = SlotEntry::from_record(&record, 110);
        assert_eq!(entry.service_id, "0xAD381FBE");
        assert_eq!(entry.version, "2.1");

        let rebuilt = entry.to_record();
        assert!(rebuilt.is_ok_and(|rebuilt| rebuilt == record));
    }

    #[test]
    fn test_invalid_entry_is_reported() {
        let mut bad = entry("Radar", 200, SafetyLevel::Qm);
        bad.service_id = "radar".to_string();
        assert!(matches!(
            bad.to_record(),
            Err(DocumentError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_missing_buckets_read_as_empty() {
        let text = r#"
version: "1.0"
metadata:
  generated_by: lap-slotgen
  source: AUTOSAR ARXML
  date: "2025-11-19"
  total_services: 1
slot_mapping:
  asil_allocations:
    - slot_index: 924
      service_name: BrakeControl
      service_id: "0xF4FC8135"
      instance_id: 0
      version: "1.0"
      binding: iceoryx2
      endpoint: /lap/BrakeControl
      safety_level: ASIL-D
"#;
        let Ok(doc) = SlotConfigDocument::from_str_as(text, OutputFormat::Yaml) else {
            panic!("document should parse");
        };
        assert!(doc.slot_mapping.static_allocations.is_empty());
        assert!(doc.slot_mapping.dynamic_allocations.is_empty());
        assert_eq!(doc.slot_mapping.asil_allocations.len(), 1);
        assert_eq!(doc.system_config, SystemConfig::default());
        assert!(doc.audit().is_empty());
    }

    #[test]
    fn test_audit_clean_document() {
        let doc = document(SlotMapping {
            static_allocations: vec![entry("Ghost", 64, SafetyLevel::Qm)],
            dynamic_allocations: vec![entry("Radar", 200, SafetyLevel::Qm)],
            asil_allocations: vec![entry("BrakeControl", 924, SafetyLevel::AsilD)],
        });
        assert!(doc.audit().is_empty());
    }

    #[test]
    fn test_audit_reports_violations() {
        let mut doc = document(SlotMapping {
            static_allocations: vec![
                entry("Svc680", 57, SafetyLevel::Qm),
                entry("Svc781", 57, SafetyLevel::Qm),
            ],
            dynamic_allocations: vec![
                entry("Radar", 950, SafetyLevel::Qm),
                entry("Camera", 20, SafetyLevel::Qm),
            ],
            asil_allocations: vec![entry("BrakeControl", 300, SafetyLevel::AsilD)],
        });
        doc.metadata.total_services = 9;

        let findings = doc.audit();
        assert!(findings.contains(&AuditFinding::DuplicateSlot {
            slot: 57,
            services: vec!["Svc680".to_string(), "Svc781".to_string()],
        }));
        assert!(findings.contains(&AuditFinding::QmInAsilPool {
            service: "Radar".to_string(),
            slot: 950,
        }));
        assert!(findings.contains(&AuditFinding::WrongBucket {
            service: "Camera".to_string(),
            bucket: Bucket::Dynamic,
        }));
        assert!(findings.contains(&AuditFinding::AsilOutsidePool {
            service: "BrakeControl".to_string(),
            slot: 300,
        }));
        assert!(findings.contains(&AuditFinding::CountMismatch {
            declared: 9,
            actual: 5,
        }));
    }

    #[test]
    fn test_output_format_selection() {
        assert_eq!(OutputFormat::from_path(Path::new("slots.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("slots.JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("slots.yaml")), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_path(Path::new("slots")), OutputFormat::Yaml);
        assert_eq!("yml".parse(), Ok(OutputFormat::Yaml));
        assert!("toml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let doc = document(SlotMapping {
            static_allocations: vec![],
            dynamic_allocations: vec![entry("Radar", 200, SafetyLevel::Qm)],
            asil_allocations: vec![entry("BrakeControl", 924, SafetyLevel::AsilD)],
        });

        for (file, format) in [
            ("out/slots.yaml", OutputFormat::Yaml),
            ("out/slots.json", OutputFormat::Json),
        ] {
            let path = temp_dir.path().join(file);
            assert!(doc.save(&path, format).is_ok(), "Failed to save {}", file);
            assert!(!path.with_file_name(format!("{}.tmp", file.trim_start_matches("out/"))).exists());

            let loaded = SlotConfigDocument::load(&path);
            assert!(
                loaded.as_ref().is_ok_and(|loaded| *loaded == doc),
                "Round trip through {} failed: {:?}",
                format,
                loaded.err()
            );
        }
    }

    #[test]
    fn test_load_missing_document() {
        let result = SlotConfigDocument::load(Path::new("/nonexistent/slots.yaml"));
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }
}
