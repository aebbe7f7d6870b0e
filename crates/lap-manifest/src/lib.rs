//! LightAP service manifest processing
//!
//! This crate turns AUTOSAR Adaptive Platform service manifests (ARXML) into
//! `ServiceRecord`s: it reads interface declarations and instance bindings out of
//! each document, reconciles bindings against the interfaces of the same document,
//! and derives a stable 32-bit identity for every record.

pub mod errors;
pub mod identity;
pub mod reader;
pub mod reconcile;
pub mod types;

pub use errors::ManifestError;
pub use identity::{assign_identities, assign_identity, derive_identity, fnv1a_32};
pub use reader::{parse_manifest, parse_permissive_int, read_manifest};
pub use reconcile::{reconcile, Reconciler};
pub use types::{
    InstanceBinding, InterfaceDecl, ManifestDocument, SafetyLevel, ServiceCategory,
    ServiceRecord, Version,
};
