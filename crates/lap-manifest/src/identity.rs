//! Service identity derivation (32-bit FNV-1a over the UTF-8 name)

use crate::types::ServiceRecord;
use tracing::debug;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of a byte slice.
#[inline]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Identity for a service name; a pure function of the name bytes
#[inline]
pub fn derive_identity(name: &str) -> u32 {
    fnv1a_32(name.as_bytes())
}

/// Derive the record's identity unless a nonzero one was supplied upstream
pub fn assign_identity(record: &mut ServiceRecord) -> u32 {
    if record.identity == 0 {
        record.identity = derive_identity(&record.name);
        debug!("{}: derived identity 0x{:08X}", record.name, record.identity);
    } else {
        debug!("{}: keeping pinned identity 0x{:08X}", record.name, record.identity);
    }
    record.identity
}

/// Assign identities to a batch of records in input order
pub fn assign_identities(records: &mut [ServiceRecord]) {
    for record in records.iter_mut() {
        assign_identity(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(derive_identity(""), 0x811c_9dc5);
        assert_eq!(derive_identity("a"), 0xe40c_292c);
        assert_eq!(derive_identity("foobar"), 0xbf9c_f968);
        assert_eq!(derive_identity("BrakeControl"), 0xf4fc_8135);
        assert_eq!(derive_identity("Ghost"), 0x1dfb_7570);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(derive_identity("Foo"), derive_identity("Foo"));
        assert_ne!(derive_identity("Foo"), derive_identity("foo"));
    }

    #[test]
    fn test_utf8_bytes_are_hashed() {
        assert_eq!(derive_identity("Brems\u{e4}"), fnv1a_32("Bremsä".as_bytes()));
        assert_ne!(derive_identity("Bremsä"), derive_identity("Bremsa"));
    }

    #[test]
    fn test_pinned_identity_is_never_overwritten() {
        let mut record = ServiceRecord::new("RadarService");
        record.identity = 0x0000_1234;
        assert_eq!(assign_identity(&mut record), 0x0000_1234);
        assert_eq!(record.identity, 0x0000_1234);
    }

    #[test]
    fn test_assign_identities_fills_zero_identities() {
        let mut records = vec![ServiceRecord::new("a"), ServiceRecord::new("foobar")];
        records[1].identity = 7;
        assign_identities(&mut records);
        assert_eq!(records[0].identity, 0xe40c_292c);
        assert_eq!(records[1].identity, 7);
    }
}
