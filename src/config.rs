//! Configuration for a [`Sampler`](crate::sampler::Sampler) instance.

use std::io;

use error::{Error, Result};
use writer::{FileTraceWriter, TraceWriter};

bitflags! {
    /// Opaque flags forwarded to the trace writer. `COMPRESSED` is the only
    /// flag the shipped [`FileTraceWriter`](crate::writer::FileTraceWriter)
    /// interprets; the rest are reserved for downstream writers.
    pub struct WriterFlags: u32 {
        const COMPRESSED = 0b0000_0001;
    }
}

impl Default for WriterFlags {
    fn default() -> Self {
        WriterFlags::empty()
    }
}

/// A `period -> delta` function handle used to schedule the next sample or
/// burst. See [`rng::sample_rnd_const`](crate::rng::sample_rnd_const) and
/// [`rng::sample_rnd_exp`](crate::rng::sample_rnd_exp) for the two stock
/// policies.
pub type RndFn = Box<dyn FnMut(u32) -> u32 + Send>;

/// Opens the writer for a new burst. Parameterized so tests can substitute
/// an in-memory [`MemoryTraceWriter`](crate::writer::MemoryTraceWriter) for
/// the default [`FileTraceWriter`](crate::writer::FileTraceWriter) without
/// touching the dispatcher.
pub type WriterFactory = Box<dyn FnMut(&str, u64, u8, WriterFlags) -> io::Result<Box<dyn TraceWriter>>>;

fn file_writer_factory() -> WriterFactory {
    Box::new(|base, idx, line_size_log2, flags| {
        FileTraceWriter::create(base, idx, line_size_log2, flags).map(|w| Box::new(w) as Box<dyn TraceWriter>)
    })
}

/// Immutable, validated configuration for a sampler run.
///
/// Built via [`SamplerConfig::new`], which checks the invariants a sampler
/// depends on and returns [`Error::ConfigError`] rather than panicking on a
/// bad combination.
pub struct SamplerConfig {
    /// Output path prefix; burst `k`'s trace is written to `"{prefix}.{k}"`.
    pub output_prefix: String,
    /// `addr >> line_size_log2` gives the cache-line index.
    pub line_size_log2: u8,
    /// Logical-time length of a burst window. Zero disables bursting.
    pub burst_size: u64,
    /// Mean logical-time gap between the end of one burst and the start of
    /// the next, fed through `burst_rnd`.
    pub burst_period: u32,
    /// Mean logical-time gap between samples within a burst, fed through
    /// `sample_rnd`.
    pub sample_period: u32,
    pub sample_rnd: RndFn,
    pub burst_rnd: RndFn,
    pub writer_flags: WriterFlags,
    pub writer_factory: WriterFactory,
}

impl SamplerConfig {
    /// Builds a config that writes each burst to `"{output_prefix}.{idx}"`
    /// on disk via [`FileTraceWriter`].
    pub fn new(
        output_prefix: impl Into<String>,
        line_size_log2: u8,
        burst_size: u64,
        burst_period: u32,
        sample_period: u32,
        sample_rnd: RndFn,
        burst_rnd: RndFn,
        writer_flags: WriterFlags,
    ) -> Result<Self> {
        Self::with_writer_factory(
            output_prefix,
            line_size_log2,
            burst_size,
            burst_period,
            sample_period,
            sample_rnd,
            burst_rnd,
            writer_flags,
            file_writer_factory(),
        )
    }

    /// As [`SamplerConfig::new`], but with an explicit writer factory --
    /// the hook tests use to substitute an in-memory writer.
    #[allow(clippy::too_many_arguments)]
    pub fn with_writer_factory(
        output_prefix: impl Into<String>,
        line_size_log2: u8,
        burst_size: u64,
        burst_period: u32,
        sample_period: u32,
        sample_rnd: RndFn,
        burst_rnd: RndFn,
        writer_flags: WriterFlags,
        writer_factory: WriterFactory,
    ) -> Result<Self> {
        let config = SamplerConfig {
            output_prefix: output_prefix.into(),
            line_size_log2,
            burst_size,
            burst_period,
            sample_period,
            sample_rnd,
            burst_rnd,
            writer_flags,
            writer_factory,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.line_size_log2 >= 64 {
            return Err(Error::ConfigError {
                reason: format!(
                    "line_size_log2 must be < 64, got {}",
                    self.line_size_log2
                ),
            });
        }

        if self.burst_size > 0 {
            if self.burst_period == 0 {
                warn!("burst_period is 0 with bursting enabled; every gap between bursts collapses to zero");
            }
            if self.sample_period == 0 {
                warn!("sample_period is 0; every access within a burst will be sampled");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rng::sample_rnd_const;

    fn rnd() -> RndFn {
        Box::new(sample_rnd_const)
    }

    #[test]
    fn rejects_oversized_line_size() {
        let err = SamplerConfig::new("out", 64, 100, 50, 10, rnd(), rnd(), WriterFlags::empty());
        assert!(err.is_err());
    }

    #[test]
    fn accepts_sane_config() {
        let ok = SamplerConfig::new("out", 6, 100, 50, 10, rnd(), rnd(), WriterFlags::empty());
        assert!(ok.is_ok());
    }

    #[test]
    fn zero_burst_size_disables_bursting_without_error() {
        let ok = SamplerConfig::new("out", 6, 0, 0, 0, rnd(), rnd(), WriterFlags::empty());
        assert!(ok.is_ok());
    }
}
