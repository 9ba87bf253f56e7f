//! Standalone harness runner over the in-process world.
//!
//! Spawns one thread per rank, runs the full suite on each, and exits with
//! the accumulated failure count. World size comes from
//! `SCATTERCHECK_RANKS` (default 4); the remaining knobs are read per rank
//! by [`HarnessConfig::from_env`].
//!
//! Run with: SCATTERCHECK_RANKS=4 cargo run --bin scattercheck

use std::process::ExitCode;

use log::LevelFilter;
use scattercheck::{run_suite, HarnessConfig, LocalWorld, Transport};

fn main() -> ExitCode {
    let num_ranks: i32 = std::env::var("SCATTERCHECK_RANKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4);

    // Map the harness debug level onto the log filter unless the caller
    // configured RUST_LOG themselves.
    let debug = HarnessConfig::from_env(0, num_ranks).debug;
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(match debug {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        });
    }
    builder.init();

    let mut handles = Vec::new();
    for endpoint in LocalWorld::new(num_ranks) {
        handles.push(std::thread::spawn(move || {
            let cfg = HarnessConfig::from_env(endpoint.rank(), endpoint.size());
            match run_suite(&endpoint, &cfg) {
                Ok(failures) => failures,
                Err(e) => {
                    eprintln!("Rank {:2}: ERROR: {e}", endpoint.rank());
                    1
                }
            }
        }));
    }

    let mut failures = 0;
    for handle in handles {
        // A panicked rank counts as a failed case.
        failures += handle.join().unwrap_or(1);
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(failures.min(255) as u8)
    }
}
