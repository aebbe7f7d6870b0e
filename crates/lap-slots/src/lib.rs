//! Registry slot allocation and slot configuration documents
//!
//! The allocator partitions the 1024-slot registry into a static pool (0-199),
//! a dynamic pool (200-923) and an ASIL-D pool (924-1023). The emitter projects
//! allocated records into the configuration document read by the registry
//! initializer.

pub mod allocator;
pub mod document;
pub mod emit;
pub mod errors;
pub mod pools;

pub use allocator::{static_bucket, AllocationStrategy, CollisionPolicy, SlotAllocator};
pub use document::{
    format_service_id, AuditFinding, Bucket, OutputFormat, SlotConfigDocument, SlotEntry,
};
pub use emit::{emit, GenerationInfo};
pub use errors::{AllocationError, DocumentError};
pub use pools::Pool;
