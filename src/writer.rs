//! Burst trace writers.
//!
//! Each burst owns exactly one writer for its whole lifetime (opened at
//! `burst_begin`, closed at shutdown -- not at `burst_end`, since dangling
//! watchpoints belonging to an already-ended burst are still appended to its
//! file). [`FileTraceWriter`] is the concrete on-disk implementation;
//! [`MemoryTraceWriter`] is an in-memory stand-in used by tests that want to
//! assert exact event ordering without touching the filesystem.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;

use access::AccessRecord;
use config::WriterFlags;
use trace_ring::TRACE_LEN;

const MAGIC: &[u8; 4] = b"RSMP";
const VERSION: u16 = 1;

const TAG_BURST_BEGIN: u8 = 0;
const TAG_SAMPLE: u8 = 1;
const TAG_STRIDE: u8 = 2;
const TAG_DANGLING: u8 = 3;
const TAG_SHORT_TRACE: u8 = 4;

/// A trace-stream output for one burst.
///
/// All methods return [`WriterError`](crate::error::Error::WriterError) on
/// failure; callers treat writer failures as fatal to the whole sampler run.
pub trait TraceWriter: fmt::Debug {
    fn burst_begin(&mut self, begin_time: u64) -> io::Result<()>;
    fn sample(&mut self, begin: &AccessRecord, end: &AccessRecord, line_size_log2: u8) -> io::Result<()>;
    fn stride(&mut self, begin: &AccessRecord, end: &AccessRecord, line_size_log2: u8) -> io::Result<()>;
    fn dangling(&mut self, access: &AccessRecord, line_size_log2: u8) -> io::Result<()>;
    fn short_trace(&mut self, access: &AccessRecord, pcs: &[u64; TRACE_LEN]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

fn write_access<W: Write>(w: &mut W, access: &AccessRecord) -> io::Result<()> {
    w.write_u64::<LittleEndian>(access.addr)?;
    w.write_u64::<LittleEndian>(access.pc)?;
    w.write_u64::<LittleEndian>(access.time)?;
    w.write_u8(access.operand)?;
    w.write_u8(access.kind as u8)
}

/// Writes a burst's trace to `"{base}.{burst_idx}"`, gzip-compressed when
/// [`WriterFlags::COMPRESSED`] is set.
pub struct FileTraceWriter {
    inner: Box<dyn Write>,
    line_size_log2: u8,
}

impl fmt::Debug for FileTraceWriter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileTraceWriter").finish()
    }
}

impl FileTraceWriter {
    pub fn create(base: &str, burst_idx: u64, line_size_log2: u8, flags: WriterFlags) -> io::Result<Self> {
        let path = format!("{}.{}", base, burst_idx);
        let file = BufWriter::new(File::create(path)?);

        let mut inner: Box<dyn Write> = if flags.contains(WriterFlags::COMPRESSED) {
            Box::new(GzEncoder::new(file, Compression::default()))
        } else {
            Box::new(file)
        };

        inner.write_all(MAGIC)?;
        inner.write_u16::<LittleEndian>(VERSION)?;
        inner.write_u8(flags.bits() as u8)?;
        inner.write_u8(line_size_log2)?;

        Ok(FileTraceWriter {
            inner,
            line_size_log2,
        })
    }
}

impl TraceWriter for FileTraceWriter {
    fn burst_begin(&mut self, begin_time: u64) -> io::Result<()> {
        self.inner.write_u8(TAG_BURST_BEGIN)?;
        self.inner.write_u64::<LittleEndian>(begin_time)
    }

    fn sample(&mut self, begin: &AccessRecord, end: &AccessRecord, line_size_log2: u8) -> io::Result<()> {
        debug_assert_eq!(line_size_log2, self.line_size_log2);
        self.inner.write_u8(TAG_SAMPLE)?;
        write_access(&mut self.inner, begin)?;
        write_access(&mut self.inner, end)
    }

    fn stride(&mut self, begin: &AccessRecord, end: &AccessRecord, line_size_log2: u8) -> io::Result<()> {
        debug_assert_eq!(line_size_log2, self.line_size_log2);
        self.inner.write_u8(TAG_STRIDE)?;
        write_access(&mut self.inner, begin)?;
        write_access(&mut self.inner, end)
    }

    fn dangling(&mut self, access: &AccessRecord, line_size_log2: u8) -> io::Result<()> {
        debug_assert_eq!(line_size_log2, self.line_size_log2);
        self.inner.write_u8(TAG_DANGLING)?;
        write_access(&mut self.inner, access)
    }

    fn short_trace(&mut self, access: &AccessRecord, pcs: &[u64; TRACE_LEN]) -> io::Result<()> {
        self.inner.write_u8(TAG_SHORT_TRACE)?;
        write_access(&mut self.inner, access)?;
        for pc in pcs {
            self.inner.write_u64::<LittleEndian>(*pc)?;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Event log kept purely in memory, for assertions in tests that care about
/// exact ordering and contents without touching the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BurstBegin { begin_time: u64 },
    Sample { begin: AccessRecord, end: AccessRecord },
    Stride { begin: AccessRecord, end: AccessRecord },
    Dangling { access: AccessRecord },
    ShortTrace {
        access: AccessRecord,
        pcs: Vec<u64>,
    },
    Closed,
}

#[derive(Debug, Default)]
pub struct MemoryTraceWriter {
    pub events: Vec<Event>,
}

impl MemoryTraceWriter {
    pub fn new() -> Self {
        MemoryTraceWriter { events: Vec::new() }
    }
}

impl TraceWriter for MemoryTraceWriter {
    fn burst_begin(&mut self, begin_time: u64) -> io::Result<()> {
        self.events.push(Event::BurstBegin { begin_time });
        Ok(())
    }

    fn sample(&mut self, begin: &AccessRecord, end: &AccessRecord, _line_size_log2: u8) -> io::Result<()> {
        self.events.push(Event::Sample {
            begin: *begin,
            end: *end,
        });
        Ok(())
    }

    fn stride(&mut self, begin: &AccessRecord, end: &AccessRecord, _line_size_log2: u8) -> io::Result<()> {
        self.events.push(Event::Stride {
            begin: *begin,
            end: *end,
        });
        Ok(())
    }

    fn dangling(&mut self, access: &AccessRecord, _line_size_log2: u8) -> io::Result<()> {
        self.events.push(Event::Dangling { access: *access });
        Ok(())
    }

    fn short_trace(&mut self, access: &AccessRecord, pcs: &[u64; TRACE_LEN]) -> io::Result<()> {
        self.events.push(Event::ShortTrace {
            access: *access,
            pcs: pcs.to_vec(),
        });
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.events.push(Event::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access::AccessType;
    use tempfile::tempdir;

    fn access(addr: u64, pc: u64, time: u64) -> AccessRecord {
        AccessRecord::new(addr, pc, time, 0, AccessType::Read)
    }

    #[test]
    fn memory_writer_records_events_in_issue_order() {
        let mut w = MemoryTraceWriter::new();
        w.burst_begin(0).unwrap();
        w.sample(&access(0x40, 1, 0), &access(0x40, 2, 10), 6).unwrap();
        w.close().unwrap();

        assert_eq!(w.events.len(), 3);
        assert!(matches!(w.events[0], Event::BurstBegin { begin_time: 0 }));
        assert!(matches!(w.events[2], Event::Closed));
    }

    #[test]
    fn file_writer_creates_an_indexed_path_and_writes_a_header() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("trace").into_os_string().into_string().unwrap();

        let mut w = FileTraceWriter::create(&base, 3, 6, WriterFlags::empty()).unwrap();
        w.burst_begin(42).unwrap();
        w.close().unwrap();

        let path = format!("{}.3", base);
        assert!(::std::path::Path::new(&path).exists());
    }

    #[test]
    fn compressed_file_writer_round_trips_the_header() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("trace").into_os_string().into_string().unwrap();

        let mut w = FileTraceWriter::create(&base, 0, 6, WriterFlags::COMPRESSED).unwrap();
        w.burst_begin(0).unwrap();
        w.close().unwrap();

        let path = format!("{}.0", base);
        assert!(::std::path::Path::new(&path).exists());
    }
}
