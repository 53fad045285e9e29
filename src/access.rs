//! The unit of work the sampler is driven with: a single instrumented memory
//! reference from the host program.

/// Tags the kind of memory reference an [`AccessRecord`] describes. Opaque to
/// the sampler core -- forwarded to the trace writer untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum AccessType {
    Read,
    Write,
    Prefetch,
}

/// A single instrumented memory reference.
///
/// `time` must be nondecreasing across successive accesses passed to the same
/// [`Sampler`](crate::sampler::Sampler); the dispatcher does not defend
/// against callers violating this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    pub addr: u64,
    pub pc: u64,
    pub time: u64,
    pub operand: u8,
    pub kind: AccessType,
}

impl AccessRecord {
    pub fn new(addr: u64, pc: u64, time: u64, operand: u8, kind: AccessType) -> Self {
        AccessRecord {
            addr,
            pc,
            time,
            operand,
            kind,
        }
    }

    /// The cache-line index this access falls in, given `line_size_log2`.
    pub fn line(&self, line_size_log2: u8) -> u64 {
        self.addr >> line_size_log2
    }
}
