//! Configuration emitter: a pure projection of allocated records into a document

use crate::document::{
    expected_bucket, Bucket, Metadata, SecurityConfig, SlotConfigDocument, SlotEntry,
    SlotMapping, SystemConfig, FORMAT_VERSION,
};
use crate::errors::DocumentError;
use lap_manifest::ServiceRecord;

pub const DEFAULT_GENERATOR: &str = "lap-slotgen";
pub const DEFAULT_SOURCE: &str = "AUTOSAR ARXML";

/// Descriptive metadata stamped into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInfo {
    pub generator: String,
    pub source: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

impl GenerationInfo {
    /// Metadata dated today (local time)
    pub fn today() -> Self {
        Self::dated(chrono::Local::now().format("%Y-%m-%d").to_string())
    }

    pub fn dated(date: impl Into<String>) -> Self {
        GenerationInfo {
            generator: DEFAULT_GENERATOR.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            date: date.into(),
        }
    }
}

impl Default for GenerationInfo {
    fn default() -> Self {
        Self::today()
    }
}

/// Group allocated records into buckets and build the configuration document.
///
/// Records keep their input order within each bucket. Every record must carry a slot.
pub fn emit(
    records: &[ServiceRecord],
    info: &GenerationInfo,
) -> Result<SlotConfigDocument, DocumentError> {
    let mut mapping = SlotMapping::default();

    for record in records {
        let slot = record
            .slot
            .ok_or_else(|| DocumentError::Unallocated(record.name.clone()))?;
        let entry = SlotEntry::from_record(record, slot);
        match expected_bucket(record.safety_level, slot) {
            Bucket::Static => mapping.static_allocations.push(entry),
            Bucket::Dynamic => mapping.dynamic_allocations.push(entry),
            Bucket::Asil => mapping.asil_allocations.push(entry),
        }
    }

    Ok(SlotConfigDocument {
        version: FORMAT_VERSION.to_string(),
        metadata: Metadata {
            generated_by: info.generator.clone(),
            source: info.source.clone(),
            date: info.date.clone(),
            total_services: records.len(),
        },
        slot_mapping: mapping,
        system_config: SystemConfig::default(),
        security: SecurityConfig::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{AllocationStrategy, CollisionPolicy, SlotAllocator};
    use crate::document::OutputFormat;
    use lap_manifest::{
        assign_identities, parse_manifest, reconcile, SafetyLevel, ServiceCategory,
    };

    fn allocated(name: &str, slot: u16) -> ServiceRecord {
        let mut record = ServiceRecord::new(name);
        record.identity = lap_manifest::derive_identity(name);
        record.slot = Some(slot);
        record
    }

    #[test]
    fn test_buckets_follow_slot_value_and_safety_level() {
        let mut hinted_static = allocated("Diagnostics", 500);
        hinted_static.category = ServiceCategory::Static;
        let records = vec![
            allocated("Ghost", 64),
            allocated("Radar", 200),
            allocated("BrakeControl", 924),
            hinted_static,
            // ASIL-D routing wins even for a slot in the static range
            allocated("SafetyMonitor", 5),
        ];

        let Ok(doc) = emit(&records, &GenerationInfo::dated("2025-11-19")) else {
            panic!("emit should succeed");
        };

        let names = |entries: &[SlotEntry]| -> Vec<String> {
            entries.iter().map(|e| e.service_name.clone()).collect()
        };
        assert_eq!(names(&doc.slot_mapping.static_allocations), vec!["Ghost"]);
        assert_eq!(
            names(&doc.slot_mapping.dynamic_allocations),
            vec!["Radar", "Diagnostics"]
        );
        assert_eq!(
            names(&doc.slot_mapping.asil_allocations),
            vec!["BrakeControl", "SafetyMonitor"]
        );
        assert_eq!(doc.metadata.total_services, 5);
        assert_eq!(doc.metadata.date, "2025-11-19");
        assert_eq!(doc.metadata.generated_by, "lap-slotgen");
        assert_eq!(doc.version, "1.0");
    }

    #[test]
    fn test_entry_formatting() {
        let Ok(doc) = emit(
            &[allocated("BrakeControl", 924)],
            &GenerationInfo::dated("2025-11-19"),
        ) else {
            panic!("emit should succeed");
        };
        let entry = &doc.slot_mapping.asil_allocations[0];
        assert_eq!(entry.slot_index, 924);
        assert_eq!(entry.service_id, "0xF4FC8135");
        assert_eq!(entry.version, "1.0");
        assert_eq!(entry.safety_level, SafetyLevel::AsilD);
        assert_eq!(entry.endpoint, "/lap/BrakeControl");
    }

    #[test]
    fn test_unallocated_record_is_rejected() {
        let records = vec![ServiceRecord::new("Radar")];
        assert!(matches!(
            emit(&records, &GenerationInfo::dated("2025-11-19")),
            Err(DocumentError::Unallocated(name)) if name == "Radar"
        ));
    }

    #[test]
    fn test_system_and_security_sections() {
        let Ok(doc) = emit(&[], &GenerationInfo::dated("2025-11-19")) else {
            panic!("emit should succeed");
        };
        assert_eq!(doc.system_config.total_slots, 1024);
        assert_eq!(doc.system_config.static_range, "0-199");
        assert_eq!(doc.system_config.dynamic_range, "200-923");
        assert_eq!(doc.system_config.asil_range, "924-1023");
        assert!(doc.system_config.enable_hugepages && doc.system_config.enable_guard_pages);
        assert!(doc.security.enable_crc32_check);
        assert!(doc.security.enable_exec_whitelist);
        assert!(doc.security.qm_asil_separation);
    }

    #[test]
    fn test_emitted_records_round_trip() {
        let text = r#"<AUTOSAR xmlns="http://autosar.org/schema/r4.0">
  <SERVICE-INTERFACE>
    <SHORT-NAME>BrakeControl</SHORT-NAME>
    <DESC><L-2 L="EN">Brake actuation</L-2></DESC>
    <MAJOR-VERSION>2</MAJOR-VERSION>
  </SERVICE-INTERFACE>
  <PROVIDED-SERVICE-INSTANCE>
    <SERVICE-INTERFACE-REF>/Chassis/BrakeControl</SERVICE-INTERFACE-REF>
  </PROVIDED-SERVICE-INSTANCE>
  <REQUIRED-SERVICE-INSTANCE>
    <SERVICE-INTERFACE-REF>/Body/Ghost</SERVICE-INTERFACE-REF>
    <INSTANCE-ID>0x10</INSTANCE-ID>
    <COMMUNICATION-CONNECTOR><TYPE>DDS</TYPE></COMMUNICATION-CONNECTOR>
  </REQUIRED-SERVICE-INSTANCE>
</AUTOSAR>"#;
        let Ok(manifest) = parse_manifest("brake.arxml", text) else {
            panic!("manifest should parse");
        };
        let mut records = reconcile(&[manifest]);
        assign_identities(&mut records);
        let mut allocator = SlotAllocator::new(AllocationStrategy::Auto, CollisionPolicy::Allow);
        assert!(allocator.assign_all(&mut records).is_ok());

        let Ok(doc) = emit(&records, &GenerationInfo::dated("2025-11-19")) else {
            panic!("emit should succeed");
        };
        let Ok(yaml) = doc.to_string_as(OutputFormat::Yaml) else {
            panic!("document should serialize");
        };
        assert!(yaml.contains("0xF4FC8135"));

        let Ok(reloaded) = SlotConfigDocument::from_str_as(&yaml, OutputFormat::Yaml) else {
            panic!("document should parse back");
        };
        let Ok(mut rebuilt) = reloaded.records() else {
            panic!("entries should rebuild records");
        };
        rebuilt.sort_by_key(|r| r.slot);
        records.sort_by_key(|r| r.slot);
        assert_eq!(rebuilt, records);
    }
}
