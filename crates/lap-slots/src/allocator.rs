//! Slot allocation
//!
//! Each record is placed by the first rule that applies, in input order:
//!
//! 1. an explicit slot hint in `[0, 1023]` is used verbatim
//! 2. ASIL-D records take the next slot of the ASIL-D pool
//! 3. static strategy or static category hashes the identity into the static pool
//! 4. everything else takes the next slot of the dynamic pool
//!
//! Cursor exhaustion is a hard error for the record that hit it. The allocator is
//! owned by a single run; nothing is shared between runs.

use crate::errors::AllocationError;
use crate::pools::{Pool, ASIL_SLOT_START, DYNAMIC_SLOT_START, MAX_SLOT};
use lap_manifest::{SafetyLevel, ServiceCategory, ServiceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Run-wide allocation strategy; only affects QM records without a hint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    #[default]
    Auto,
    Static,
    Dynamic,
}

impl AllocationStrategy {
    pub const VARIANTS: [&'static str; 3] = ["auto", "static", "dynamic"];
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStrategy::Auto => f.write_str("auto"),
            AllocationStrategy::Static => f.write_str("static"),
            AllocationStrategy::Dynamic => f.write_str("dynamic"),
        }
    }
}

impl FromStr for AllocationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(AllocationStrategy::Auto),
            "static" => Ok(AllocationStrategy::Static),
            "dynamic" => Ok(AllocationStrategy::Dynamic),
            other => Err(format!(
                "Unknown strategy '{}' (expected one of: {})",
                other,
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

/// What to do when a hashed static slot is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Hand out the shared slot anyway and log it
    #[default]
    Allow,
    /// Scan upward (wrapping) within the static pool for the next free slot
    Probe,
    /// Fail the record
    Reject,
}

impl CollisionPolicy {
    pub const VARIANTS: [&'static str; 3] = ["allow", "probe", "reject"];
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Allow => f.write_str("allow"),
            CollisionPolicy::Probe => f.write_str("probe"),
            CollisionPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(CollisionPolicy::Allow),
            "probe" => Ok(CollisionPolicy::Probe),
            "reject" => Ok(CollisionPolicy::Reject),
            other => Err(format!(
                "Unknown collision policy '{}' (expected one of: {})",
                other,
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

/// Allocator state for one run
#[derive(Debug)]
pub struct SlotAllocator {
    strategy: AllocationStrategy,
    collision_policy: CollisionPolicy,
    next_dynamic_slot: u16,
    next_asil_slot: u16,
    /// Static pool occupancy: slot -> first service placed there
    static_owners: BTreeMap<u16, String>,
}

impl SlotAllocator {
    pub fn new(strategy: AllocationStrategy, collision_policy: CollisionPolicy) -> Self {
        SlotAllocator {
            strategy,
            collision_policy,
            next_dynamic_slot: DYNAMIC_SLOT_START,
            next_asil_slot: ASIL_SLOT_START,
            static_owners: BTreeMap::new(),
        }
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Choose a slot for `record` without modifying it
    pub fn allocate(&mut self, record: &ServiceRecord) -> Result<u16, AllocationError> {
        if let Some(hint) = record.slot_hint {
            if hint <= MAX_SLOT {
                // Hints bypass pool and collision checks
                self.occupy_static(hint, &record.name);
                debug!("{}: using slot hint {}", record.name, hint);
                return Ok(hint);
            }
            warn!(
                "{}: ignoring slot hint {} outside 0-{}",
                record.name, hint, MAX_SLOT
            );
        }

        if record.safety_level == SafetyLevel::AsilD {
            return self.take_asil(record);
        }

        if self.strategy == AllocationStrategy::Static || record.category == ServiceCategory::Static
        {
            return self.take_static(record);
        }

        self.take_dynamic(record)
    }

    /// Allocate and store the slot on the record
    pub fn assign(&mut self, record: &mut ServiceRecord) -> Result<u16, AllocationError> {
        let slot = self.allocate(record)?;
        record.slot = Some(slot);
        Ok(slot)
    }

    /// Assign slots to every record in input order, stopping at the first failure
    pub fn assign_all(&mut self, records: &mut [ServiceRecord]) -> Result<(), AllocationError> {
        for record in records.iter_mut() {
            self.assign(record)?;
        }
        Ok(())
    }

    fn take_asil(&mut self, record: &ServiceRecord) -> Result<u16, AllocationError> {
        let slot = self.next_asil_slot;
        if !Pool::Asil.contains(slot) {
            return Err(exhausted(record, Pool::Asil));
        }
        self.next_asil_slot += 1;
        debug!("{}: ASIL-D slot {}", record.name, slot);
        Ok(slot)
    }

    fn take_dynamic(&mut self, record: &ServiceRecord) -> Result<u16, AllocationError> {
        let slot = self.next_dynamic_slot;
        if !Pool::Dynamic.contains(slot) {
            return Err(exhausted(record, Pool::Dynamic));
        }
        self.next_dynamic_slot += 1;
        debug!("{}: dynamic slot {}", record.name, slot);
        Ok(slot)
    }

    fn take_static(&mut self, record: &ServiceRecord) -> Result<u16, AllocationError> {
        let bucket = static_bucket(record.identity);
        let holder = self.static_owners.get(&bucket).cloned();

        let slot = match (holder, self.collision_policy) {
            (None, _) => bucket,
            (Some(holder), CollisionPolicy::Allow) => {
                warn!(
                    "{}: static slot {} shared with {}",
                    record.name, bucket, holder
                );
                bucket
            }
            (Some(holder), CollisionPolicy::Reject) => {
                return Err(AllocationError::StaticCollision {
                    service: record.name.clone(),
                    slot: bucket,
                    holder,
                });
            }
            (Some(holder), CollisionPolicy::Probe) => {
                let slot = self
                    .probe_free_static(bucket)
                    .ok_or_else(|| exhausted(record, Pool::Static))?;
                debug!(
                    "{}: static slot {} held by {}, probed to {}",
                    record.name, bucket, holder, slot
                );
                slot
            }
        };

        self.occupy_static(slot, &record.name);
        debug!("{}: static slot {}", record.name, slot);
        Ok(slot)
    }

    fn probe_free_static(&self, bucket: u16) -> Option<u16> {
        let start = Pool::Static.start();
        let size = Pool::Static.size();
        (0..size)
            .map(|offset| start + (bucket - start + offset) % size)
            .find(|slot| !self.static_owners.contains_key(slot))
    }

    fn occupy_static(&mut self, slot: u16, service: &str) {
        if Pool::Static.contains(slot) {
            self.static_owners
                .entry(slot)
                .or_insert_with(|| service.to_string());
        }
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        SlotAllocator::new(AllocationStrategy::default(), CollisionPolicy::default())
    }
}

/// Hash bucket of an identity in the static pool
pub fn static_bucket(identity: u32) -> u16 {
    let size = u32::from(Pool::Static.size());
    Pool::Static.start() + (identity % size) as u16
}

fn exhausted(record: &ServiceRecord, pool: Pool) -> AllocationError {
    AllocationError::PoolExhausted {
        service: record.name.clone(),
        pool,
    }
}
