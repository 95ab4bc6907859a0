// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (ToDO) ppcore coprocess

//! Preprocess C/C++ files while preserving `#include` directives.
//!
//! Each input runs through up to three stages: `pre` hides every include
//! behind a marker and a commented pragma, `mid` pipes the lines through an
//! external preprocessor, and `post` restores the includes that survived
//! conditional compilation. Input/output pairs are processed concurrently
//! by a bounded worker pool.

#[macro_use]
extern crate ppcore;

use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use log::info;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use regex::Regex;

use ppcore::error::{set_exit_code, UResult, USimpleError};

mod coprocess;
mod error;
mod line;
mod mid;
mod pipeline;
mod post;
mod pre;
mod settings;
mod uu_args;

pub use uu_args::uu_app;

use settings::Settings;

pub fn uumain(args: impl ppcore::Args) -> UResult<()> {
    init_logging();
    let matches = uu_app().get_matches_from(args);
    let settings = Settings::from_matches(&matches)?;
    process(&settings)
}

fn process(settings: &Settings) -> UResult<()> {
    let seed = machine_seed();
    info!("machine+app seed:{seed}");
    let rgx = Regex::new(pre::INCLUDE_PATTERN).unwrap();

    let mut pairs = settings.pairs.clone();
    let mut rng = SmallRng::seed_from_u64(seed);
    pairs.shuffle(&mut rng);

    // One pool thread per pair, plus three carrier threads inside each
    // active worker.
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());
    let max_workers = (cpus + 4).min(32).min(pairs.len()).max(1);
    info!("bound on number of workers:{max_workers}");

    for (ind, (input, output)) in pairs.iter().enumerate() {
        info!(
            "{} file{} submitted: {} -> {}",
            ind + 1,
            plural(ind + 1),
            input,
            output
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()
        .map_err(|e| USimpleError::new(1, e.to_string()))?;
    let completed = AtomicUsize::new(0);
    pool.install(|| {
        pairs.par_iter().for_each(|(input, output)| {
            let rng = SmallRng::seed_from_u64(seed);
            let result = pipeline::filter(input, output, settings, &rgx, rng);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            match result {
                Ok(()) => {
                    info!(
                        "{done} file{} processed: {input} -> {output}",
                        plural(done)
                    );
                }
                Err(e) => {
                    show_error!("{e}");
                    set_exit_code(1);
                }
            }
        });
    });
    Ok(())
}

/// A process-stable seed from the machine name and the executable, so reruns
/// on one host replay the same tags.
fn machine_seed() -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Ok(name) = hostname::get() {
        name.hash(&mut hasher);
    }
    if let Ok(exe) = env::current_exe() {
        exe.hash(&mut hasher);
    }
    hasher.finish()
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", "warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
