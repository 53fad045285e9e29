//! A reuse-distance memory-reference sampler.
//!
//! A host program instrumented to call [`sampler::Sampler::reference`] on
//! every memory access gets back a sequence of compressed binary trace
//! files -- one per sampling burst -- recording sampled reuse pairs,
//! stride-detection pairs, and short instruction-PC windows leading up to
//! each sample. See [`sampler::Sampler`] for the entry point.

#[macro_use]
extern crate bitflags;
extern crate byteorder;
#[macro_use]
extern crate failure_derive;
extern crate arrayvec;
extern crate failure;
extern crate flate2;
#[macro_use]
extern crate log;
extern crate rand;
extern crate serde;
#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate env_logger;
#[cfg(test)]
extern crate pretty_assertions;
#[cfg(test)]
extern crate tempfile;

pub mod access;
pub mod burst;
pub mod config;
pub mod error;
pub mod rng;
pub mod sampler;
pub mod trace_ring;
pub mod watchpoint;
pub mod writer;

pub use access::{AccessRecord, AccessType};
pub use config::{SamplerConfig, WriterFlags};
pub use error::{Error, Result};
pub use sampler::Sampler;
