//! Sweep command.
//!
//! Reads every word of a counting image through a [`Minicache`] and the
//! configured engine, first in address order and then in a seeded random
//! order. Each access is checked twice: the value must equal the word index,
//! and the backing store must be read exactly as often as `inspect` predicted
//! (once for a predicted miss, never for a predicted hit or a requester hit).

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use l2cache_core::cache::{DirectMappedCache, TwoWayCache};
use l2cache_core::config::{CacheConfig, CacheKind};
use l2cache_core::requester::Minicache;
use l2cache_core::stats::CacheStats;
use l2cache_core::store::{BackingStore, ReadCounter, mean_duration};
use l2cache_core::FillEngine;

use crate::CliError;

/// Knobs shared by both phases.
#[derive(Clone, Copy, Debug)]
pub struct SweepOptions {
    /// Seed for the random phase.
    pub seed: u64,
    /// Lines in the requester model.
    pub minicache_lines: usize,
}

/// Outcome of one phase.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PhaseReport {
    /// `"sequential"` or `"random"`.
    pub phase: &'static str,
    /// Words read.
    pub accesses: usize,
    /// Engine statistics for this phase only.
    pub stats: CacheStats,
    /// Accesses served by the requester without a fill request.
    pub requester_hits: u64,
    /// Backing-store reads issued during this phase.
    pub backing_reads: u64,
    /// Wall time spent in the backing store.
    #[serde(with = "micros")]
    pub read_time: Duration,
}

/// Full sweep result.
#[derive(Clone, Debug, Serialize)]
pub struct SweepReport {
    /// Configuration the engine was set up with.
    pub config: CacheConfig,
    /// Words in the swept image.
    pub words: usize,
    /// Seed of the random phase.
    pub seed: u64,
    /// Sequential then random.
    pub phases: Vec<PhaseReport>,
}

mod micros {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_micros())
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?}: {} lines x {} bytes, {} words, seed {}",
            self.config.kind, self.config.line_count, self.config.line_size_bytes, self.words, self.seed
        )?;
        for phase in &self.phases {
            writeln!(f)?;
            writeln!(f, "== {} ({} accesses) ==", phase.phase, phase.accesses)?;
            writeln!(f, "{}", phase.stats)?;
            writeln!(f, "  requester_hits         {}", phase.requester_hits)?;
            writeln!(f, "  backing_reads          {}", phase.backing_reads)?;
            let average = mean_duration(phase.read_time, phase.backing_reads).unwrap_or_default();
            writeln!(f, "  avg_read_time          {average:?}")?;
        }
        Ok(())
    }
}

/// Sets up the engine for `config` over `store` and runs both phases.
///
/// The image is assumed to be mapped at `base` with word `i` holding `i`.
pub fn run<S: BackingStore>(
    config: &CacheConfig,
    store: S,
    base: u32,
    words: usize,
    options: &SweepOptions,
) -> Result<SweepReport, CliError> {
    let geometry = config.validate()?;
    let store = ReadCounter::new(store);
    info!(kind = ?config.kind, words, seed = options.seed, "starting sweep");

    let phases = match config.kind {
        CacheKind::DirectMapped => {
            let mut engine = DirectMappedCache::new(geometry, store);
            drive(&mut engine, base, words, options, |e| e.store())?
        }
        CacheKind::TwoWay => {
            let mut engine = TwoWayCache::new(geometry, store);
            drive(&mut engine, base, words, options, |e| e.store())?
        }
    };

    Ok(SweepReport {
        config: *config,
        words,
        seed: options.seed,
        phases,
    })
}

fn drive<E, S>(
    engine: &mut E,
    base: u32,
    words: usize,
    options: &SweepOptions,
    counter: impl Fn(&E) -> &ReadCounter<S>,
) -> Result<Vec<PhaseReport>, CliError>
where
    E: FillEngine,
    S: BackingStore,
{
    let mut rng = StdRng::seed_from_u64(options.seed);
    let sequential: Vec<usize> = (0..words).collect();
    let random: Vec<usize> = (0..words).map(|_| rng.random_range(0..words)).collect();

    let mut reports = Vec::with_capacity(2);
    for (phase, order) in [("sequential", sequential), ("random", random)] {
        let mut minicache = Minicache::new(options.minicache_lines);
        engine.reset_stats();
        let reads_before = counter(engine).reads();
        let time_before = counter(engine).read_time();

        for &index in &order {
            let address = base.wrapping_add(index as u32 * 4);
            let predicted_miss = !engine.inspect(address).is_hit();
            let reads = counter(engine).reads();
            let requester_misses = minicache.misses();

            let value = minicache.read_u32(&mut *engine, address)?;
            if value != index as u32 {
                return Err(CliError::WrongValue { phase, index, value });
            }

            let filled = minicache.misses() != requester_misses;
            let expected = u64::from(filled && predicted_miss);
            let actual = counter(engine).reads() - reads;
            if actual != expected {
                return Err(CliError::UnexpectedReads {
                    phase,
                    index,
                    expected,
                    actual,
                });
            }
        }

        let report = PhaseReport {
            phase,
            accesses: order.len(),
            stats: *engine.stats(),
            requester_hits: minicache.hits(),
            backing_reads: counter(engine).reads() - reads_before,
            read_time: counter(engine).read_time() - time_before,
        };
        debug!(phase, hits = report.stats.hit_count, misses = report.stats.miss_count, "phase done");
        reports.push(report);
    }
    Ok(reports)
}
