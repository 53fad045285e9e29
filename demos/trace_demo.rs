//! Drives a `Sampler` over a small synthetic access stream and reports what
//! came out, so the crate has something runnable without a real
//! instrumentation front-end. Not part of the public API.

extern crate env_logger;
extern crate log;
extern crate reuse_sampler;

use reuse_sampler::rng::{sample_rnd_const, sample_rnd_exp};
use reuse_sampler::{AccessRecord, AccessType, Sampler, SamplerConfig, WriterFlags};

fn main() {
    env_logger::Builder::from_default_env()
        .filter(None, ::log::LevelFilter::Info)
        .init();

    let dir = std::env::temp_dir().join("reuse-sampler-demo");
    std::fs::create_dir_all(&dir).expect("failed to create demo output directory");
    let prefix = dir.join("trace").into_os_string().into_string().unwrap();

    let config = SamplerConfig::new(
        prefix.clone(),
        6,
        200,
        50,
        20,
        Box::new(sample_rnd_exp),
        Box::new(sample_rnd_const),
        WriterFlags::COMPRESSED,
    )
    .expect("demo config is valid");

    let mut sampler = Sampler::init(config);

    // A toy access stream: a handful of lines touched repeatedly at
    // different strides, enough to exercise reuse, stride, and dangling
    // accounting in one run.
    let lines = [0x1000u64, 0x2000, 0x1000, 0x3000, 0x2000, 0x1000];
    for (i, &addr) in lines.iter().cycle().take(400).enumerate() {
        let time = i as u64;
        let pc = 0x400000 + (i as u64 % 7) * 4;
        let access = AccessRecord::new(addr, pc, time, 0, AccessType::Read);
        sampler
            .reference(access)
            .expect("demo stream should not hit a writer error");
    }

    println!("burst active at end of stream: {}", sampler.burst_active());
    sampler.finalize().expect("finalize should not fail");
    println!("wrote trace bursts under {}.*", prefix);
}
