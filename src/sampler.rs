//! The reference dispatcher: the sampler's single hot-path entry point.
//!
//! [`Sampler::reference`] composes the line-watchpoint table, PC-watchpoint
//! table, burst scheduler, short-trace ring, and burst writer in the fixed
//! order the design depends on. Reordering any of the five steps below
//! breaks one of the invariants documented on the module's types -- in
//! particular, burst-end must be checked before burst-begin within one call,
//! since both can land on the same logical time when a `burst_rnd` draw is
//! zero.

use std::rc::{Rc, Weak};

use access::AccessRecord;
use burst::{BurstHandle, Scheduler};
use config::SamplerConfig;
use error::{Error, Result};
use trace_ring::ShortTraceRing;
use watchpoint::WatchpointTable;

pub struct Sampler {
    config: SamplerConfig,
    scheduler: Scheduler,
    line_table: WatchpointTable,
    pc_table: WatchpointTable,
    trace_ring: ShortTraceRing,
    active_burst: Option<Weak<BurstHandle>>,
    bursts: Vec<Rc<BurstHandle>>,
}

impl Sampler {
    /// Allocates a fresh sampler from a validated config. Tables and the
    /// trace ring start empty; no burst is open until the first `reference`
    /// call reaches logical time zero (the configured `burst_begin`).
    pub fn init(config: SamplerConfig) -> Self {
        Sampler {
            scheduler: Scheduler::new(0),
            line_table: WatchpointTable::new(),
            pc_table: WatchpointTable::new(),
            trace_ring: ShortTraceRing::new(),
            active_burst: None,
            bursts: Vec::new(),
            config,
        }
    }

    pub fn burst_active(&self) -> bool {
        self.scheduler.is_active()
    }

    #[cfg(test)]
    fn line_watchpoints(&self) -> usize {
        self.line_table.len()
    }

    #[cfg(test)]
    fn pc_watchpoints(&self) -> usize {
        self.pc_table.len()
    }

    /// Dispatches one memory access through the sampler. See the module
    /// docs for why the five steps below may not be reordered.
    pub fn reference(&mut self, access: AccessRecord) -> Result<()> {
        let line = access.line(self.config.line_size_log2);

        // 1. line-watchpoint lookup
        if let Some(entry) = self.line_table.lookup_and_remove(line, access.operand) {
            if let Some(burst) = entry.burst.upgrade() {
                burst
                    .writer()
                    .sample(&entry.access, &access, self.config.line_size_log2)
                    .map_err(writer_error)?;
            }
        }

        // 2. PC-watchpoint lookup
        if let Some(entry) = self.pc_table.lookup_and_remove(access.pc, access.operand) {
            if let Some(burst) = entry.burst.upgrade() {
                burst
                    .writer()
                    .stride(&entry.access, &access, self.config.line_size_log2)
                    .map_err(writer_error)?;
            }
        }

        if self.config.burst_size == 0 {
            return Ok(());
        }

        // 3a. burst end, checked before 3b. burst begin -- both can land on
        // the same logical time.
        if self.scheduler.should_end_burst(access.time) {
            self.scheduler.end_burst(
                access.time,
                &mut *self.config.burst_rnd,
                self.config.burst_period,
            );
            self.active_burst = None;
        }

        let is_first_of_burst = if self.scheduler.should_begin_burst(access.time) {
            let idx = self.scheduler.begin_burst(access.time, self.config.burst_size);
            let mut writer = (self.config.writer_factory)(
                &self.config.output_prefix,
                idx,
                self.config.line_size_log2,
                self.config.writer_flags,
            )
            .map_err(writer_error)?;
            writer.burst_begin(access.time).map_err(writer_error)?;
            let handle = BurstHandle::new(idx, access.time, writer);
            self.active_burst = Some(Rc::downgrade(&handle));
            self.bursts.push(handle);
            true
        } else {
            false
        };

        // 4. pre-sample trace recording
        if self.scheduler.in_trace_window(access.time) && !is_first_of_burst {
            if access.time == self.scheduler.trace_begin_time || access.time == self.scheduler.next_sample {
                self.trace_ring.record(access.pc, access.time);
            } else {
                self.trace_ring.record(access.pc, 0);
            }
        }

        // 5. sample placement
        if self.scheduler.is_sample_time(access.time) {
            if let Some(burst) = self.active_burst.as_ref().and_then(Weak::upgrade) {
                self.line_table.insert(line, access.operand, access, Rc::downgrade(&burst));

                if !is_first_of_burst {
                    if let Some(pcs) = self.trace_ring.flush(access.time) {
                        burst
                            .writer()
                            .short_trace(&access, &pcs)
                            .map_err(writer_error)?;
                    }
                }

                self.pc_table.insert(access.pc, access.operand, access, Rc::downgrade(&burst));

                let new_trace_begin = self.scheduler.advance_after_sample(
                    access.time,
                    &mut *self.config.sample_rnd,
                    self.config.sample_period,
                );

                if new_trace_begin <= access.time {
                    self.trace_ring.record(access.pc, new_trace_begin);
                }
            }
        }

        Ok(())
    }

    /// Drains the line table into dangling events, then closes every burst
    /// writer in the order it was opened. The PC table is discarded without
    /// flushing -- stride watchpoints carry no unique information once the
    /// run is over, matching the sampler this crate is modeled on.
    pub fn finalize(mut self) -> Result<()> {
        for entry in self.line_table.drain() {
            if let Some(burst) = entry.burst.upgrade() {
                burst
                    .writer()
                    .dangling(&entry.access, self.config.line_size_log2)
                    .map_err(writer_error)?;
            }
        }

        for burst in &self.bursts {
            burst.writer().close().map_err(writer_error)?;
        }

        Ok(())
    }
}

fn writer_error(inner: ::std::io::Error) -> Error {
    Error::WriterError {
        inner: inner.to_string(),
    }
}
