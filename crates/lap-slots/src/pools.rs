//! Registry address space and its three allocation pools

use std::fmt;
use std::ops::RangeInclusive;

/// Number of slots in the shared-memory registry
pub const TOTAL_SLOTS: u16 = 1024;
/// Highest valid slot index
pub const MAX_SLOT: u16 = TOTAL_SLOTS - 1;

pub const STATIC_SLOT_START: u16 = 0;
pub const STATIC_SLOT_END: u16 = 199;
pub const DYNAMIC_SLOT_START: u16 = 200;
pub const DYNAMIC_SLOT_END: u16 = 923;
pub const ASIL_SLOT_START: u16 = 924;
pub const ASIL_SLOT_END: u16 = 1023;

/// One of the three disjoint slot ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Static,
    Dynamic,
    Asil,
}

impl Pool {
    pub const ALL: [Pool; 3] = [Pool::Static, Pool::Dynamic, Pool::Asil];

    pub fn start(self) -> u16 {
        match self {
            Pool::Static => STATIC_SLOT_START,
            Pool::Dynamic => DYNAMIC_SLOT_START,
            Pool::Asil => ASIL_SLOT_START,
        }
    }

    pub fn end(self) -> u16 {
        match self {
            Pool::Static => STATIC_SLOT_END,
            Pool::Dynamic => DYNAMIC_SLOT_END,
            Pool::Asil => ASIL_SLOT_END,
        }
    }

    pub fn range(self) -> RangeInclusive<u16> {
        self.start()..=self.end()
    }

    pub fn size(self) -> u16 {
        self.end() - self.start() + 1
    }

    pub fn contains(self, slot: u16) -> bool {
        self.range().contains(&slot)
    }

    /// Pool a slot index falls in, `None` past the end of the registry
    pub fn of_slot(slot: u16) -> Option<Pool> {
        Pool::ALL.into_iter().find(|pool| pool.contains(slot))
    }

    /// Range as written in the configuration document, e.g. `200-923`
    pub fn range_string(self) -> String {
        format!("{}-{}", self.start(), self.end())
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Static => f.write_str("static"),
            Pool::Dynamic => f.write_str("dynamic"),
            Pool::Asil => f.write_str("ASIL-D"),
        }
    }
}
