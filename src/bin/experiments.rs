// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! Experiment harness for the sketch implementations.
//!
//! Each subcommand runs one experiment and prints exactly one comma-separated
//! row to stdout; those rows are the harness's only stable output. Pass
//! `--seed` for reproducible runs.

use std::collections::HashSet;
use std::hint::black_box;
use std::io;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dynsketch::bitarray::BitArray;
use dynsketch::buffered_minhash::BufferedMinHash;
use dynsketch::counting_minhash::CountingMinHash;
use dynsketch::hash::{self, HashFn, PairwiseHash};

#[derive(Parser)]
#[command(name = "experiments", about = "Sketch throughput and accuracy experiments")]
struct Cli {
    /// Seed for reproducible runs; drawn from the OS when absent.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert n elements into a buffered MinHash, then remove all of them.
    DmhStream {
        #[arg(long, default_value_t = 64)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        l: usize,
        #[arg(long, default_value_t = 100_000)]
        n: usize,
    },
    /// Insert n elements into a counting MinHash, then remove all of them.
    DssStream {
        #[arg(long, default_value_t = 1_024)]
        c: u32,
        #[arg(long, default_value_t = 100_000)]
        n: usize,
    },
    /// Preload a counting MinHash and time repeated signature queries.
    DssQuery {
        #[arg(long, default_value_t = 1_024)]
        c: u32,
        #[arg(long, default_value_t = 100_000)]
        size: usize,
        #[arg(long, default_value_t = 1_000)]
        queries: usize,
        #[arg(long, default_value_t = 16)]
        hashes: usize,
    },
    /// Stream updates through a buffered MinHash with interleaved queries.
    DmhMixed {
        #[arg(long, default_value_t = 64)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        l: usize,
        #[arg(long, default_value_t = 100_000)]
        n: usize,
        /// Fraction of operations replaced by signature queries.
        #[arg(long, default_value_t = 0.01)]
        p: f64,
    },
    /// Stream updates through a counting MinHash with interleaved queries.
    DssMixed {
        #[arg(long, default_value_t = 1_024)]
        c: u32,
        #[arg(long, default_value_t = 100_000)]
        n: usize,
        #[arg(long, default_value_t = 16)]
        hashes: usize,
        /// Fraction of operations replaced by signature queries.
        #[arg(long, default_value_t = 0.01)]
        p: f64,
    },
    /// Slide a fixed-size window of insertions and removals over the stream.
    DmhWindow {
        #[arg(long, default_value_t = 64)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        l: usize,
        #[arg(long, default_value_t = 100_000)]
        n: u32,
        #[arg(long, default_value_t = 1_000)]
        window: u32,
    },
    /// Measure buffered-MinHash estimation error on correlated bit arrays.
    DmhAccuracy {
        #[arg(long, default_value_t = 64)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        l: usize,
        #[arg(long, default_value_t = 100_000)]
        universe: u32,
        /// Probability of dropping a member of the base set.
        #[arg(long, default_value_t = 0.1)]
        p1: f64,
        /// Probability of adding a non-member of the base set.
        #[arg(long, default_value_t = 0.01)]
        p2: f64,
    },
    /// Measure counting-MinHash estimation error on correlated bit arrays.
    DssAccuracy {
        #[arg(long, default_value_t = 1_024)]
        c: u32,
        #[arg(long, default_value_t = 16)]
        hashes: usize,
        #[arg(long, default_value_t = 100_000)]
        universe: u32,
        /// Probability of dropping a member of the base set.
        #[arg(long, default_value_t = 0.1)]
        p1: f64,
        /// Probability of adding a non-member of the base set.
        #[arg(long, default_value_t = 0.01)]
        p2: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let outcome = match cli.command {
        Command::DmhStream { k, l, n } => dmh_stream(k, l, n, &mut rng),
        Command::DssStream { c, n } => dss_stream(c, n, &mut rng),
        Command::DssQuery { c, size, queries, hashes } => {
            dss_query(c, size, queries, hashes, &mut rng)
        }
        Command::DmhMixed { k, l, n, p } => dmh_mixed(k, l, n, p, &mut rng),
        Command::DssMixed { c, n, hashes, p } => dss_mixed(c, n, hashes, p, &mut rng),
        Command::DmhWindow { k, l, n, window } => dmh_window(k, l, n, window, &mut rng),
        Command::DmhAccuracy { k, l, universe, p1, p2 } => {
            dmh_accuracy(k, l, universe, p1, p2, &mut rng)
        }
        Command::DssAccuracy { c, hashes, universe, p1, p2 } => {
            dss_accuracy(c, hashes, universe, p1, p2, &mut rng)
        }
    };

    if let Err(error) = outcome {
        eprintln!("experiments: {error}");
        std::process::exit(1);
    }
}

/// Draws `count` distinct values uniformly from the 32-bit universe.
fn distinct_sample(count: usize, rng: &mut StdRng) -> Vec<u32> {
    let mut seen = HashSet::with_capacity(count);
    let mut sample = Vec::with_capacity(count);
    while sample.len() < count {
        let value: u32 = rng.random();
        if seen.insert(value) {
            sample.push(value);
        }
    }
    sample
}

fn emit_row(fields: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(fields)?;
    writer.flush()?;
    Ok(())
}

fn dmh_stream(k: usize, l: usize, n: usize, rng: &mut StdRng) -> Result<()> {
    let family = hash::tabulation_family_from_rng(k, rng)?;
    let mut sketch = BufferedMinHash::with_hashes(k, l, family)?;
    let sample = distinct_sample(n, rng);

    let start = Instant::now();
    for &value in &sample {
        sketch.insert(value);
    }

    let mut faults = 0_u64;
    for (index, &value) in sample.iter().enumerate() {
        if sketch.remove(value) {
            faults += 1;
            // Recovery query: replay the elements that are still live.
            for &remaining in &sample[index + 1..] {
                sketch.insert(remaining);
            }
        }
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DMH".into(),
        k.to_string(),
        l.to_string(),
        (2 * n).to_string(),
        faults.to_string(),
        format!("{seconds:.6}"),
    ])
}

fn dss_stream(c: u32, n: usize, rng: &mut StdRng) -> Result<()> {
    let mut sketch = dss_from_rng(c, 1, rng)?;
    let sample = distinct_sample(n, rng);

    let start = Instant::now();
    for &value in &sample {
        sketch.insert(value);
    }
    for &value in &sample {
        sketch.remove(value);
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DSS".into(),
        c.to_string(),
        sketch.rows().to_string(),
        (2 * n).to_string(),
        format!("{seconds:.6}"),
    ])
}

fn dss_query(c: u32, size: usize, queries: usize, hashes: usize, rng: &mut StdRng) -> Result<()> {
    let mut sketch = dss_from_rng(c, hashes, rng)?;
    for &value in &distinct_sample(size, rng) {
        sketch.insert(value);
    }

    let start = Instant::now();
    for _ in 0..queries {
        black_box(sketch.signature());
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DSS".into(),
        c.to_string(),
        sketch.rows().to_string(),
        size.to_string(),
        queries.to_string(),
        hashes.to_string(),
        format!("{seconds:.6}"),
    ])
}

fn dmh_mixed(k: usize, l: usize, n: usize, p: f64, rng: &mut StdRng) -> Result<()> {
    let family = hash::tabulation_family_from_rng(k, rng)?;
    let mut sketch = BufferedMinHash::with_hashes(k, l, family)?;
    let sample = distinct_sample(n + 1, rng);
    let stride = query_stride(p);

    sketch.insert(sample[0]);

    let start = Instant::now();
    for (index, &value) in sample.iter().enumerate().skip(1) {
        if index % stride == 0 {
            black_box(sketch.signature());
        }
        sketch.insert(value);
    }

    let mut faults = 0_u64;
    for index in 1..sample.len() {
        if index % stride == 0 {
            black_box(sketch.signature());
        }
        if sketch.remove(sample[index]) {
            faults += 1;
            for &remaining in &sample[index + 1..] {
                sketch.insert(remaining);
            }
        }
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DMH".into(),
        k.to_string(),
        l.to_string(),
        (2 * n).to_string(),
        k.to_string(),
        faults.to_string(),
        format!("{p:.2}"),
        format!("{seconds:.6}"),
    ])
}

fn dss_mixed(c: u32, n: usize, hashes: usize, p: f64, rng: &mut StdRng) -> Result<()> {
    let mut sketch = dss_from_rng(c, hashes, rng)?;
    let sample = distinct_sample(n + 1, rng);
    let stride = query_stride(p);

    sketch.insert(sample[0]);

    let start = Instant::now();
    for (index, &value) in sample.iter().enumerate().skip(1) {
        if index % stride == 0 {
            black_box(sketch.signature());
        }
        sketch.insert(value);
    }
    for index in 1..sample.len() {
        if index % stride == 0 {
            black_box(sketch.signature());
        }
        sketch.remove(sample[index]);
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DSS".into(),
        c.to_string(),
        sketch.rows().to_string(),
        (2 * n).to_string(),
        hashes.to_string(),
        "0".into(),
        format!("{p:.2}"),
        format!("{seconds:.6}"),
    ])
}

fn dmh_window(k: usize, l: usize, n: u32, window: u32, rng: &mut StdRng) -> Result<()> {
    let family = hash::tabulation_family_from_rng(k, rng)?;
    let mut sketch = BufferedMinHash::with_hashes(k, l, family)?;
    for value in 0..window {
        sketch.insert(value);
    }

    let start = Instant::now();
    let mut faults = 0_u64;
    let mut first = 0_u32;
    for _ in 0..n {
        if sketch.remove(first) {
            faults += 1;
            for value in first + 1..first + window {
                sketch.insert(value);
            }
        }
        sketch.insert(first + window + 1);
        first += 1;
    }
    let seconds = start.elapsed().as_secs_f64();

    emit_row(&[
        "DMH".into(),
        k.to_string(),
        l.to_string(),
        (2 * n).to_string(),
        window.to_string(),
        faults.to_string(),
        format!("{seconds:.6}"),
    ])
}

fn dmh_accuracy(
    k: usize,
    l: usize,
    universe: u32,
    p1: f64,
    p2: f64,
    rng: &mut StdRng,
) -> Result<()> {
    let family = hash::tabulation_family_from_rng(k, rng)?;
    let mut left = BufferedMinHash::with_hashes(k, l, family.clone())?;
    let mut right = BufferedMinHash::with_hashes(k, l, family)?;

    let base = BitArray::from_rng(universe, 0.05, rng)?;
    let derived = base.perturbed_from_rng(p1, p2, rng)?;
    for index in 0..universe {
        if base.get(index) {
            left.insert(index);
        }
        if derived.get(index) {
            right.insert(index);
        }
    }

    let estimate = left.estimate_jaccard(&right)?;
    let truth = base.jaccard(&derived)?;
    let error = estimate - truth;

    emit_row(&[
        "DMH".into(),
        k.to_string(),
        l.to_string(),
        universe.to_string(),
        format!("{p1:.2}"),
        format!("{p2:.2}"),
        format!("{truth:.6}"),
        format!("{estimate:.6}"),
        format!("{:.6}", error * error),
    ])
}

fn dss_accuracy(
    c: u32,
    hashes: usize,
    universe: u32,
    p1: f64,
    p2: f64,
    rng: &mut StdRng,
) -> Result<()> {
    let mut left = dss_from_rng(c, hashes, rng)?;
    let mut right = left.clone();

    let base = BitArray::from_rng(universe, 0.05, rng)?;
    let derived = base.perturbed_from_rng(p1, p2, rng)?;
    for index in 0..universe {
        if base.get(index) {
            left.insert(index);
        }
        if derived.get(index) {
            right.insert(index);
        }
    }

    // The original experiments run the size-adaptive estimator with a wide
    // acceptance range.
    let estimate = left.estimate_jaccard(&right, 0.1, 0.25)?;
    let truth = base.jaccard(&derived)?;
    let error = estimate - truth;

    emit_row(&[
        "DSS".into(),
        c.to_string(),
        hashes.to_string(),
        universe.to_string(),
        format!("{p1:.2}"),
        format!("{p2:.2}"),
        format!("{truth:.6}"),
        format!("{estimate:.6}"),
        format!("{:.6}", error * error),
    ])
}

fn dss_from_rng(c: u32, t: usize, rng: &mut StdRng) -> Result<CountingMinHash> {
    let h1 = HashFn::Pairwise(PairwiseHash::from_rng(u32::MAX, rng)?);
    let h2 = HashFn::Pairwise(PairwiseHash::from_rng(c, rng)?);
    let hashes = hash::pairwise_family_from_rng(t, u32::MAX, rng)?;
    Ok(CountingMinHash::with_hashes(c, h1, h2, hashes)?)
}

/// Number of operations between two interleaved queries.
fn query_stride(p: f64) -> usize {
    if p <= 0.0 {
        usize::MAX
    } else {
        ((1.0 / p) as usize).max(1)
    }
}
