//! Reconciliation of instance bindings against interface declarations
//!
//! Every instance binding yields exactly one `ServiceRecord`. Bindings are resolved
//! only against interfaces declared in the same document; the first declaration with
//! a given name wins.

use crate::types::{
    default_endpoint, placeholder_name, InstanceBinding, InterfaceDecl, ManifestDocument,
    SafetyLevel, ServiceCategory, ServiceRecord, Version, DEFAULT_BINDING,
};
use ahash::AHashMap;
use tracing::{debug, warn};

/// Accumulates records for one run, one document at a time
#[derive(Debug, Default)]
pub struct Reconciler {
    records: Vec<ServiceRecord>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile one document's bindings, appending the resulting records.
    ///
    /// Returns the number of records added.
    pub fn reconcile_document(&mut self, document: &ManifestDocument) -> usize {
        let index = interface_index(document);
        let before = self.records.len();

        for binding in &document.instances {
            let interface = index
                .get(binding.service_ref.as_str())
                .map(|&idx| &document.interfaces[idx]);
            if interface.is_none() {
                debug!(
                    "{}: unresolved interface reference '{}'",
                    document.source, binding.service_ref
                );
            }
            let record = self.build_record(binding, interface);
            self.records.push(record);
        }

        self.records.len() - before
    }

    /// Records reconciled so far, in input order
    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ServiceRecord> {
        self.records
    }

    fn build_record(
        &self,
        binding: &InstanceBinding,
        interface: Option<&InterfaceDecl>,
    ) -> ServiceRecord {
        // Ordinal defaults come from the run-wide record count
        let ordinal = self.records.len();

        let (name, version, description) = match interface {
            Some(decl) => (
                decl.name.clone(),
                Version::new(
                    decl.major_version.unwrap_or(Version::default().major),
                    decl.minor_version.unwrap_or(Version::default().minor),
                ),
                decl.description.clone().unwrap_or_default(),
            ),
            None if binding.service_ref.is_empty() => {
                (placeholder_name(ordinal), Version::default(), String::new())
            }
            None => (binding.service_ref.clone(), Version::default(), String::new()),
        };

        ServiceRecord {
            identity: 0,
            instance_id: binding
                .instance_id
                .unwrap_or_else(|| u32::try_from(ordinal).unwrap_or(u32::MAX)),
            version,
            binding: binding
                .binding
                .clone()
                .unwrap_or_else(|| DEFAULT_BINDING.to_string()),
            endpoint: binding
                .endpoint
                .clone()
                .unwrap_or_else(|| default_endpoint(&name)),
            safety_level: SafetyLevel::classify(&name),
            category: ServiceCategory::default(),
            description,
            slot_hint: None,
            slot: None,
            name,
        }
    }
}

/// Reconcile a sequence of documents in order
pub fn reconcile(documents: &[ManifestDocument]) -> Vec<ServiceRecord> {
    let mut reconciler = Reconciler::new();
    for document in documents {
        reconciler.reconcile_document(document);
    }
    reconciler.into_records()
}

/// Name -> index of the first interface declaring it; unnamed interfaces are unreachable
fn interface_index(document: &ManifestDocument) -> AHashMap<&str, usize> {
    let mut index = AHashMap::with_capacity(document.interfaces.len());
    for (idx, decl) in document.interfaces.iter().enumerate() {
        if decl.name.is_empty() {
            continue;
        }
        if index.contains_key(decl.name.as_str()) {
            warn!(
                "{}: duplicate service interface '{}', keeping the first declaration",
                document.source, decl.name
            );
            continue;
        }
        index.insert(decl.name.as_str(), idx);
    }
    index
}
