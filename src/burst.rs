//! Burst handles and the IDLE/ACTIVE scheduling state machine.
//!
//! A burst handle is shared by everything that needs to address its writer
//! during the burst's lifetime: the `active_burst` slot, and every
//! watchpoint placed while it was open. The sampler's burst list
//! (`Vec<Rc<BurstHandle>>`) is the sole strong owner; the `active_burst`
//! slot and watchpoint entries hold only `Weak` references, so a burst
//! outlives `burst_end` (it keeps accepting dangling/stride events) but is
//! only ever dropped once the sampler itself drops the list at shutdown.

use std::cell::RefCell;
use std::rc::Rc;

use writer::TraceWriter;

/// One open (or previously-open, not-yet-closed) burst: its writer and a
/// name for diagnostics.
pub struct BurstHandle {
    pub idx: u64,
    pub begin_time: u64,
    writer: RefCell<Box<dyn TraceWriter>>,
}

impl BurstHandle {
    pub fn new(idx: u64, begin_time: u64, writer: Box<dyn TraceWriter>) -> Rc<Self> {
        Rc::new(BurstHandle {
            idx,
            begin_time,
            writer: RefCell::new(writer),
        })
    }

    pub fn writer(&self) -> ::std::cell::RefMut<Box<dyn TraceWriter>> {
        self.writer.borrow_mut()
    }
}

/// `IDLE` between bursts, `ACTIVE` while one is open. Owned by the sampler;
/// never observed directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstState {
    Idle,
    Active,
}

/// The pure scheduling decisions the dispatcher needs to make before it
/// touches any watchpoint table -- kept separate from `Sampler` so the
/// end-before-begin ordering contract (see module docs on
/// [`Sampler::reference`](crate::sampler::Sampler::reference)) is testable
/// in isolation from the writer and table plumbing.
pub struct Scheduler {
    pub state: BurstState,
    pub burst_begin: u64,
    pub burst_end: u64,
    pub next_sample: u64,
    pub trace_begin_time: u64,
    pub burst_idx: u64,
}

impl Scheduler {
    pub fn new(first_burst_begin: u64) -> Self {
        Scheduler {
            state: BurstState::Idle,
            burst_begin: first_burst_begin,
            burst_end: 0,
            next_sample: 0,
            trace_begin_time: 0,
            burst_idx: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == BurstState::Active
    }

    /// True when `time` ends the currently-active burst.
    pub fn should_end_burst(&self, time: u64) -> bool {
        self.is_active() && time == self.burst_end
    }

    /// True when `time` opens a new burst. Only meaningful once
    /// `should_end_burst` has already been handled for this call.
    pub fn should_begin_burst(&self, time: u64) -> bool {
        !self.is_active() && time == self.burst_begin
    }

    /// Transitions `ACTIVE -> IDLE` and schedules the next `burst_begin`.
    pub fn end_burst(&mut self, time: u64, burst_rnd: &mut dyn FnMut(u32) -> u32, burst_period: u32) {
        self.state = BurstState::Idle;
        self.burst_begin = time + u64::from(burst_rnd(burst_period));
    }

    /// Transitions `IDLE -> ACTIVE`: every burst samples its very first
    /// access.
    pub fn begin_burst(&mut self, time: u64, burst_size: u64) -> u64 {
        self.state = BurstState::Active;
        self.next_sample = time;
        self.burst_end = time + burst_size;
        self.burst_idx += 1;
        self.burst_idx - 1
    }

    /// True when `time` is within the pre-sample trace-recording window:
    /// `[trace_begin_time, next_sample]`, while a burst is active.
    pub fn in_trace_window(&self, time: u64) -> bool {
        self.is_active() && time >= self.trace_begin_time && time <= self.next_sample
    }

    /// True when `time` is a sample point.
    pub fn is_sample_time(&self, time: u64) -> bool {
        self.is_active() && time == self.next_sample
    }

    /// Advances `next_sample`/`trace_begin_time` after a sample is placed.
    /// Returns the new `trace_begin_time`, so the caller can decide whether
    /// to seed the ring for the upcoming window (step 5e in the dispatcher).
    pub fn advance_after_sample(
        &mut self,
        time: u64,
        sample_rnd: &mut dyn FnMut(u32) -> u32,
        sample_period: u32,
    ) -> u64 {
        let delta = sample_rnd(sample_period).max(1);
        self.next_sample = time + u64::from(delta);
        self.trace_begin_time = self.next_sample.saturating_sub(TRACE_LEN_U64);
        self.trace_begin_time
    }
}

use trace_ring::TRACE_LEN;
const TRACE_LEN_U64: u64 = TRACE_LEN as u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_burst_samples_the_first_access() {
        let mut sched = Scheduler::new(0);
        assert!(sched.should_begin_burst(0));
        let idx = sched.begin_burst(0, 100);
        assert_eq!(idx, 0);
        assert!(sched.is_sample_time(0));
        assert_eq!(sched.burst_end, 100);
    }

    #[test]
    fn end_before_begin_ordering_when_both_land_on_the_same_time() {
        let mut sched = Scheduler::new(0);
        sched.begin_burst(0, 10);
        assert!(sched.should_end_burst(10));
        let mut zero = |_: u32| 0u32;
        sched.end_burst(10, &mut zero, 5);
        assert_eq!(sched.burst_begin, 10);
        assert!(sched.should_begin_burst(10));
    }

    #[test]
    fn advance_after_sample_clamps_zero_draws_to_one() {
        let mut sched = Scheduler::new(0);
        sched.begin_burst(0, 100);
        let mut zero = |_: u32| 0u32;
        sched.advance_after_sample(0, &mut zero, 50);
        assert_eq!(sched.next_sample, 1);
    }
}
