//! Service pin files
//!
//! A pin file fixes per-service values that must survive manifest regeneration:
//!
//! ```toml
//! [[service]]
//! name = "DiagnosticsService"
//! service_id = 0x00001234
//! slot = 12
//! category = "static"
//! ```
//!
//! Pins are matched by exact service name and applied to every record with that name.

use crate::error::ConfigError;
use lap_manifest::{ServiceCategory, ServiceRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Values pinned for one service
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServicePin {
    pub name: String,
    /// Nonzero values replace the derived identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u32>,
    /// Explicit slot hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ServiceCategory>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PinFile {
    #[serde(default, rename = "service")]
    pub services: Vec<ServicePin>,
}

impl PinFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse pin file text; names must be non-empty and unique
    pub fn parse(content: &str) -> Result<Self, String> {
        let pins: PinFile = toml::from_str(content).map_err(|e| e.to_string())?;

        let mut seen = HashSet::new();
        for pin in &pins.services {
            if pin.name.is_empty() {
                return Err("service pin with an empty name".to_string());
            }
            if !seen.insert(pin.name.as_str()) {
                return Err(format!("service '{}' is pinned more than once", pin.name));
            }
        }
        Ok(pins)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ServicePin> {
        self.services.iter().find(|pin| pin.name == name)
    }

    /// Apply pins to matching records.
    ///
    /// Returns the names of pins that matched no record.
    pub fn apply(&self, records: &mut [ServiceRecord]) -> Vec<String> {
        let by_name: HashMap<&str, &ServicePin> = self
            .services
            .iter()
            .map(|pin| (pin.name.as_str(), pin))
            .collect();
        let mut matched = HashSet::new();

        for record in records.iter_mut() {
            let Some(pin) = by_name.get(record.name.as_str()) else {
                continue;
            };
            matched.insert(pin.name.as_str());

            if let Some(service_id) = pin.service_id.filter(|id| *id != 0) {
                record.identity = service_id;
            }
            if let Some(slot) = pin.slot {
                record.slot_hint = Some(slot);
            }
            if let Some(category) = pin.category {
                record.category = category;
            }
        }

        self.services
            .iter()
            .filter(|pin| !matched.contains(pin.name.as_str()))
            .map(|pin| pin.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PINS: &str = r#"
[[service]]
name = "DiagnosticsService"
service_id = 0x00001234
slot = 12
category = "static"

[[service]]
name = "RadarService"
category = "static"

[[service]]
name = "Unused"
service_id = 0
"#;

    #[test]
    fn test_parse_pins() {
        let Ok(pins) = PinFile::parse(PINS) else {
            panic!("pins should parse");
        };
        assert_eq!(pins.services.len(), 3);
        assert_eq!(
            pins.get("DiagnosticsService"),
            Some(&ServicePin {
                name: "DiagnosticsService".to_string(),
                service_id: Some(0x1234),
                slot: Some(12),
                category: Some(ServiceCategory::Static),
            })
        );
    }

    #[test]
    fn test_apply_pins() {
        let Ok(pins) = PinFile::parse(PINS) else {
            panic!("pins should parse");
        };
        let mut records = vec![
            ServiceRecord::new("DiagnosticsService"),
            ServiceRecord::new("RadarService"),
            ServiceRecord::new("CameraService"),
            ServiceRecord::new("DiagnosticsService"),
        ];

        let unmatched = pins.apply(&mut records);

        assert_eq!(unmatched, vec!["Unused".to_string()]);
        for diag in [&records[0], &records[3]] {
            assert_eq!(diag.identity, 0x1234);
            assert_eq!(diag.slot_hint, Some(12));
            assert_eq!(diag.category, ServiceCategory::Static);
        }
        assert_eq!(records[1].identity, 0);
        assert_eq!(records[1].slot_hint, None);
        assert_eq!(records[1].category, ServiceCategory::Static);
        assert_eq!(records[2], ServiceRecord::new("CameraService"));
    }

    #[test]
    fn test_zero_service_id_pins_nothing() {
        let Ok(pins) = PinFile::parse("[[service]]\nname = \"Radar\"\nservice_id = 0\n") else {
            panic!("pins should parse");
        };
        let mut records = vec![ServiceRecord::new("Radar")];
        assert!(pins.apply(&mut records).is_empty());
        assert_eq!(records[0].identity, 0);
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_keys() {
        let duplicate = "[[service]]\nname = \"A\"\n[[service]]\nname = \"A\"\n";
        assert!(PinFile::parse(duplicate).is_err_and(|e| e.contains("more than once")));

        let unknown = "[[service]]\nname = \"A\"\npriority = 3\n";
        assert!(PinFile::parse(unknown).is_err());

        let empty_name = "[[service]]\nname = \"\"\n";
        assert!(PinFile::parse(empty_name).is_err());
    }

    #[test]
    fn test_load_pin_file() {
        let Ok(mut file) = NamedTempFile::new() else {
            return;
        };
        assert!(file.write_all(PINS.as_bytes()).is_ok());
        assert!(PinFile::load(file.path()).is_ok_and(|pins| pins.services.len() == 3));

        assert!(matches!(
            PinFile::load(Path::new("/nonexistent/pins.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
