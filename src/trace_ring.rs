//! The short-trace ring: a rolling window of recently-seen program counters,
//! flushed into a short-trace event whenever a sample's reuse is witnessed.
//!
//! The "hash" of an entry is simply `time mod TRACE_LEN`, so a fixed-size
//! array of small per-slot buffers stands in for the original's intrusive
//! hash-bucket-per-slot list, per the design notes on preferring native
//! containers.

use arrayvec::ArrayVec;

/// Number of slots in the ring; also the length of the PC array attached to
/// every short-trace event.
pub const TRACE_LEN: usize = 32;

/// How many PCs a single slot can hold before the oldest is evicted. Bounded
/// by `TRACE_LEN` itself: a `record(pc, 0)` broadcast (see `record` below)
/// writes into every slot at once, so a slot can legitimately accumulate up
/// to `TRACE_LEN` entries between flushes, and `flush` must be able to pop
/// all of them.
const SLOT_CAPACITY: usize = TRACE_LEN;

#[derive(Clone, Copy)]
struct Entry {
    pc: u64,
    time: u64,
}

pub struct ShortTraceRing {
    slots: Vec<ArrayVec<Entry, SLOT_CAPACITY>>,
}

impl ShortTraceRing {
    pub fn new() -> Self {
        ShortTraceRing {
            slots: (0..TRACE_LEN).map(|_| ArrayVec::new()).collect(),
        }
    }

    /// Records `pc` observed at `time`. `time == 0` is a seeding sentinel:
    /// instead of landing in a single slot, the entry is written to every
    /// slot, so the current PC shows up no matter which slot the next
    /// sample's flush reads from. This replicates the original sampler's
    /// undocumented seeding behavior.
    pub fn record(&mut self, pc: u64, time: u64) {
        if time == 0 {
            for slot in &mut self.slots {
                push_bounded(slot, Entry { pc, time });
            }
        } else {
            let idx = (time as usize) % TRACE_LEN;
            push_bounded(&mut self.slots[idx], Entry { pc, time });
        }
    }

    /// Pops up to `TRACE_LEN` PCs from the slot for `sample_time`, in
    /// chronological order, zero-filling any that were never written, and
    /// clears that slot. Returns `None` if the slot was empty.
    pub fn flush(&mut self, sample_time: u64) -> Option<[u64; TRACE_LEN]> {
        let idx = (sample_time as usize) % TRACE_LEN;
        let slot = &mut self.slots[idx];
        if slot.is_empty() {
            return None;
        }

        let mut entries: Vec<Entry> = slot.drain(..).collect();
        entries.sort_by_key(|e| e.time);

        let mut pcs = [0u64; TRACE_LEN];
        for (dst, entry) in pcs.iter_mut().zip(entries.iter()) {
            *dst = entry.pc;
        }
        Some(pcs)
    }
}

fn push_bounded(slot: &mut ArrayVec<Entry, SLOT_CAPACITY>, entry: Entry) {
    if slot.is_full() {
        slot.remove(0);
    }
    slot.push(entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_on_empty_slot_returns_none() {
        let mut ring = ShortTraceRing::new();
        assert!(ring.flush(5).is_none());
    }

    #[test]
    fn record_and_flush_round_trips_a_single_pc() {
        let mut ring = ShortTraceRing::new();
        ring.record(0xdead, 7);
        let pcs = ring.flush(7).unwrap();
        assert_eq!(pcs[0], 0xdead);
        assert_eq!(pcs[1..].iter().all(|&p| p == 0), true);
    }

    #[test]
    fn flush_clears_the_slot() {
        let mut ring = ShortTraceRing::new();
        ring.record(0xbeef, 3);
        assert!(ring.flush(3).is_some());
        assert!(ring.flush(3).is_none());
    }

    #[test]
    fn zero_time_seeds_every_slot() {
        let mut ring = ShortTraceRing::new();
        ring.record(0x1, 0);
        for slot in 0..TRACE_LEN as u64 {
            let pcs = ring.flush(slot).expect("every slot should have been seeded");
            assert_eq!(pcs[0], 0x1);
        }
    }

    #[test]
    fn distinct_times_hashing_to_the_same_slot_both_appear_in_order() {
        let mut ring = ShortTraceRing::new();
        ring.record(0xa, TRACE_LEN as u64);
        ring.record(0xb, 2 * TRACE_LEN as u64);
        let pcs = ring.flush(0).unwrap();
        assert_eq!(pcs[0], 0xa);
        assert_eq!(pcs[1], 0xb);
    }
}
