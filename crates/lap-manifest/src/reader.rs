//! Manifest reader
//!
//! Extracts service interface declarations and service instance bindings from an
//! ARXML document. Elements are matched by local name suffix so that any namespace
//! prefix is accepted; only the fields needed for reconciliation are pulled out.

use crate::errors::ManifestError;
use crate::types::{InstanceBinding, InterfaceDecl, ManifestDocument};
use roxmltree::Node;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const INTERFACE_SUFFIX: &str = "SERVICE-INTERFACE";
const PROVIDED_INSTANCE_SUFFIX: &str = "PROVIDED-SERVICE-INSTANCE";
const REQUIRED_INSTANCE_SUFFIX: &str = "REQUIRED-SERVICE-INSTANCE";

const SHORT_NAME: &str = "SHORT-NAME";
const MAJOR_VERSION: &str = "MAJOR-VERSION";
const MINOR_VERSION: &str = "MINOR-VERSION";
const DESC: &str = "DESC";
const INSTANCE_ID: &str = "INSTANCE-ID";
const SERVICE_INTERFACE_REF: &str = "SERVICE-INTERFACE-REF";
const COMMUNICATION_CONNECTOR: &str = "COMMUNICATION-CONNECTOR";
const CONNECTOR_TYPE: &str = "TYPE";
const ENDPOINT: &str = "ENDPOINT";
const LANGUAGE_BLOCK: &str = "L-2";
const PREFERRED_LANGUAGE: &str = "EN";

/// Read and parse a manifest file
pub fn read_manifest(path: &Path) -> Result<ManifestDocument, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }

    debug!("Reading manifest: {:?}", path);
    let content = fs::read_to_string(path)?;
    parse_manifest(&path.display().to_string(), &content)
}

/// Parse manifest text; `source` only labels diagnostics
pub fn parse_manifest(source: &str, text: &str) -> Result<ManifestDocument, ManifestError> {
    let xml = roxmltree::Document::parse(text)?;
    let mut document = ManifestDocument::new(source);

    for node in xml.descendants().filter(Node::is_element) {
        let tag = node.tag_name().name();
        if tag.ends_with(INTERFACE_SUFFIX) {
            document.interfaces.push(extract_interface(node, source));
        } else if tag.ends_with(PROVIDED_INSTANCE_SUFFIX) || tag.ends_with(REQUIRED_INSTANCE_SUFFIX)
        {
            document.instances.push(extract_instance(node, source));
        }
    }

    debug!(
        "{}: {} interface(s), {} instance(s)",
        source,
        document.interfaces.len(),
        document.instances.len()
    );
    Ok(document)
}

fn extract_interface(node: Node<'_, '_>, source: &str) -> InterfaceDecl {
    let name = find_text(node, SHORT_NAME).unwrap_or_default();
    InterfaceDecl {
        major_version: find_int(node, MAJOR_VERSION, source),
        minor_version: find_int(node, MINOR_VERSION, source),
        description: find_descendant(node, DESC).and_then(description_text),
        name,
    }
}

fn extract_instance(node: Node<'_, '_>, source: &str) -> InstanceBinding {
    // Symbolic paths are not followed: only the trailing name is matched later
    let service_ref = find_text(node, SERVICE_INTERFACE_REF)
        .and_then(|reference| reference.rsplit('/').next().map(str::to_string))
        .unwrap_or_default();

    let binding = find_descendant(node, COMMUNICATION_CONNECTOR)
        .and_then(|connector| find_text(connector, CONNECTOR_TYPE))
        .map(|kind| kind.to_lowercase());

    InstanceBinding {
        instance_id: find_int(node, INSTANCE_ID, source),
        service_ref,
        binding,
        endpoint: find_text(node, ENDPOINT),
    }
}

/// First descendant (document order, excluding `node`) with the given local name
fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn find_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    find_descendant(node, name)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn find_int(node: Node<'_, '_>, name: &str, source: &str) -> Option<u32> {
    let text = find_text(node, name)?;
    let value = parse_permissive_int(&text);
    if value.is_none() {
        warn!("{}: ignoring unparseable {} value '{}'", source, name, text);
    }
    value
}

/// Description text: the `L="EN"` language block, else the first non-empty block.
///
/// A `DESC` without language blocks contributes all of its text.
fn description_text(desc: Node<'_, '_>) -> Option<String> {
    let blocks: Vec<_> = desc
        .descendants()
        .filter(|child| child.is_element() && child.tag_name().name() == LANGUAGE_BLOCK)
        .collect();
    if blocks.is_empty() {
        return collected_text(desc);
    }

    let preferred = blocks.iter().find(|block| {
        block
            .attribute("L")
            .is_some_and(|lang| lang.eq_ignore_ascii_case(PREFERRED_LANGUAGE))
    });
    preferred
        .and_then(|block| collected_text(*block))
        .or_else(|| blocks.iter().find_map(|block| collected_text(*block)))
}

/// All text below `node`, trimmed
fn collected_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse an unsigned integer written in decimal, `0x` hex, `0o` octal or `0b` binary.
///
/// Surrounding whitespace and `_` digit separators are ignored.
pub fn parse_permissive_int(text: &str) -> Option<u32> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (digits, radix) = match cleaned.get(..2) {
        Some("0x" | "0X") => (&cleaned[2..], 16),
        Some("0o" | "0O") => (&cleaned[2..], 8),
        Some("0b" | "0B") => (&cleaned[2..], 2),
        _ => (cleaned.as_str(), 10),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}
