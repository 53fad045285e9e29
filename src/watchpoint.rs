//! The two watchpoint tables: deferred commitments to pair the *next* access
//! matching a key with the access that created the watchpoint.
//!
//! Both the cache-line reuse table and the PC-stride table are instances of
//! this same structure, keyed on `(u64, u8)` -- `(line_index, operand)` for
//! the former, `(pc, operand)` for the latter. A native `HashMap` stands in
//! for the intrusive hash buckets of the original; duplicates on one key are
//! permitted (the table is a multiset) but selection among them on lookup is
//! unspecified.

use std::collections::HashMap;
use std::rc::Weak;

use access::AccessRecord;
use burst::BurstHandle;

/// A pending watchpoint: the access that created it, and the burst it
/// belongs to. `burst` is a non-owning reference -- the sampler's burst list
/// is the sole strong owner, per the shutdown ordering in
/// [`Sampler::finalize`](crate::sampler::Sampler::finalize).
pub struct WatchpointEntry {
    pub access: AccessRecord,
    pub burst: Weak<BurstHandle>,
}

#[derive(Default)]
pub struct WatchpointTable {
    entries: HashMap<(u64, u8), Vec<WatchpointEntry>>,
}

impl WatchpointTable {
    pub fn new() -> Self {
        WatchpointTable {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: u64, operand: u8, access: AccessRecord, burst: Weak<BurstHandle>) {
        self.entries
            .entry((key, operand))
            .or_insert_with(Vec::new)
            .push(WatchpointEntry { access, burst });
    }

    /// Removes and returns one matching entry, if any. Which one is
    /// returned among duplicates on the same key is unspecified.
    pub fn lookup_and_remove(&mut self, key: u64, operand: u8) -> Option<WatchpointEntry> {
        use std::collections::hash_map::Entry;

        match self.entries.entry((key, operand)) {
            Entry::Vacant(_) => None,
            Entry::Occupied(mut bucket) => {
                let entry = bucket.get_mut().pop();
                if bucket.get().is_empty() {
                    bucket.remove();
                }
                entry
            }
        }
    }

    /// Removes and returns every entry currently held, in unspecified order.
    /// Used only at shutdown.
    pub fn drain(&mut self) -> Vec<WatchpointEntry> {
        self.entries.drain().flat_map(|(_, v)| v).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access::AccessType;
    use std::rc::Rc;

    fn access(addr: u64, pc: u64, time: u64) -> AccessRecord {
        AccessRecord::new(addr, pc, time, 0, AccessType::Read)
    }

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut table = WatchpointTable::new();
        let burst: Weak<BurstHandle> = Weak::new();
        table.insert(1, 0, access(0x40, 1, 0), burst.clone());

        let found = table.lookup_and_remove(1, 0).expect("entry should be present");
        assert_eq!(found.access, access(0x40, 1, 0));
        assert!(table.lookup_and_remove(1, 0).is_none());
    }

    #[test]
    fn operand_disambiguates_otherwise_identical_keys() {
        let mut table = WatchpointTable::new();
        let burst: Weak<BurstHandle> = Weak::new();
        table.insert(1, 0, access(0x40, 1, 0), burst.clone());
        table.insert(1, 1, access(0x40, 2, 1), burst);

        assert!(table.lookup_and_remove(1, 2).is_none());
        assert_eq!(table.lookup_and_remove(1, 1).unwrap().access.pc, 2);
        assert_eq!(table.lookup_and_remove(1, 0).unwrap().access.pc, 1);
    }

    #[test]
    fn drain_empties_the_table() {
        let mut table = WatchpointTable::new();
        let burst: Weak<BurstHandle> = Weak::new();
        table.insert(1, 0, access(0x40, 1, 0), burst.clone());
        table.insert(2, 0, access(0x80, 2, 5), burst);

        let drained = table.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn multiset_allows_duplicate_keys() {
        let mut table = WatchpointTable::new();
        let burst: Weak<BurstHandle> = Weak::new();
        table.insert(1, 0, access(0x40, 1, 0), burst.clone());
        table.insert(1, 0, access(0x40, 2, 1), burst);

        assert_eq!(table.len(), 2);
        assert!(table.lookup_and_remove(1, 0).is_some());
        assert!(table.lookup_and_remove(1, 0).is_some());
        assert!(table.lookup_and_remove(1, 0).is_none());
    }
}
