//! L2 cache driver CLI.
//!
//! This binary exercises the cache engines end to end. It performs:
//! 1. **Sweep:** Reads every word of a counting image sequentially, then in random
//!    order, through a requester model and the configured engine, checking every
//!    value and every hit/miss prediction against the backing-store read count.
//! 2. **Inspect:** Prints the decomposition, entry state and predicted fill for an
//!    address, optionally after warming the cache with other addresses.

mod sweep;

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use l2cache_core::config::{CacheConfig, CacheKind};
use l2cache_core::store::{FlatMemory, ImageFile};
use l2cache_core::{BackingStoreError, CacheError, FillEngine};

use crate::sweep::SweepOptions;

/// Default address the backing store is mapped at (start of the SwMem region).
const DEFAULT_BASE: &str = "0x40000000";

#[derive(Parser, Debug)]
#[command(
    name = "l2cache",
    author,
    version,
    about = "Software-managed read-only L2 cache driver",
    long_about = "Sweep a counting image through a direct-mapped or two-way L2 cache, or inspect how an address maps onto it.\n\nExamples:\n  l2cache sweep --kind two-way --words 65536\n  l2cache sweep --config cache.json --image flash.bin\n  l2cache inspect 0x40004010 --warm 0x40000010"
)]
struct Cli {
    /// Log filter (e.g. `debug`, `l2cache_core=trace`); defaults to `RUST_LOG` or `warn`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read every word sequentially, then randomly, and verify values and hit/miss behaviour.
    Sweep {
        #[command(flatten)]
        cache: CacheArgs,

        #[command(flatten)]
        image: ImageArgs,

        /// Seed for the random phase.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Lines in the requester model.
        #[arg(long, default_value_t = l2cache_core::requester::DEFAULT_MINICACHE_LINES)]
        minicache_lines: usize,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how an address decomposes and what a fill for it would do.
    Inspect {
        /// Address to inspect (hex with 0x prefix, or decimal).
        #[arg(value_parser = parse_addr)]
        address: u32,

        /// Addresses to fill before inspecting.
        #[arg(long, value_parser = parse_addr)]
        warm: Vec<u32>,

        #[command(flatten)]
        cache: CacheArgs,

        #[command(flatten)]
        image: ImageArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    DirectMapped,
    TwoWay,
}

impl From<KindArg> for CacheKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::DirectMapped => Self::DirectMapped,
            KindArg::TwoWay => Self::TwoWay,
        }
    }
}

/// Cache geometry options; flags override values loaded from `--config`.
#[derive(Args, Debug)]
struct CacheArgs {
    /// JSON cache configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache organisation.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Number of cache indices (power of two).
    #[arg(long)]
    line_count: Option<u32>,

    /// Line size in bytes (power of two, at least 32).
    #[arg(long)]
    line_size: Option<u32>,
}

/// Backing-store options.
#[derive(Args, Debug)]
struct ImageArgs {
    /// Flash image file holding a counting image (word `i` is `i`); defaults to a generated one.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Address the image is mapped at.
    #[arg(long, value_parser = parse_addr, default_value = DEFAULT_BASE)]
    base: u32,

    /// Words in the generated image, or the most words swept from `--image`.
    #[arg(long, default_value_t = 64 * 1024)]
    words: usize,
}

/// Failures reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Setup or fill failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The backing store could not be opened.
    #[error(transparent)]
    Store(#[from] BackingStoreError),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    ConfigRead {
        /// Configuration path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a cache configuration.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A word read back through the cache differs from the image.
    #[error("{phase}: word {index} read back as {value:#010x}")]
    WrongValue {
        /// Sweep phase.
        phase: &'static str,
        /// Word index.
        index: usize,
        /// Value returned through the cache.
        value: u32,
    },

    /// A fill touched the backing store differently from its prediction.
    #[error("{phase}: word {index} predicted {expected} backing-store reads, saw {actual}")]
    UnexpectedReads {
        /// Sweep phase.
        phase: &'static str,
        /// Word index.
        index: usize,
        /// Reads implied by the inspection.
        expected: u64,
        /// Reads observed.
        actual: u64,
    },
}

/// Parses `0x`-prefixed hex or decimal addresses.
fn parse_addr(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address {text:?}: {e}"))
}

/// Loads `--config` if given and applies flag overrides.
fn load_config(args: &CacheArgs) -> Result<CacheConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => CacheConfig::default(),
    };
    if let Some(kind) = args.kind {
        config.kind = kind.into();
    }
    if let Some(line_count) = args.line_count {
        config.line_count = line_count;
    }
    if let Some(line_size) = args.line_size {
        config.line_size_bytes = line_size;
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<CacheConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sweep(
    cache: &CacheArgs,
    image: &ImageArgs,
    options: &SweepOptions,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(cache)?;
    let report = match &image.image {
        Some(path) => {
            let store = ImageFile::open(path, image.base)?;
            let words = image.words.min((store.len() / 4) as usize);
            sweep::run(&config, store, image.base, words, options)?
        }
        None => {
            let store = FlatMemory::counting_words(image.base, image.words);
            sweep::run(&config, store, image.base, image.words, options)?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn cmd_inspect(
    address: u32,
    warm: &[u32],
    cache: &CacheArgs,
    image: &ImageArgs,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(cache)?;
    let mut engine = match &image.image {
        Some(path) => l2cache_core::setup(&config, ImageFile::open(path, image.base)?)?,
        None => l2cache_core::setup(
            &config,
            FlatMemory::counting_words(image.base, image.words),
        )?,
    };
    for &addr in warm {
        let _ = engine.service_fill(addr)?;
    }

    let info = engine.inspect(address);
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{info}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let result = match &cli.command {
        Commands::Sweep {
            cache,
            image,
            seed,
            minicache_lines,
            json,
        } => cmd_sweep(
            cache,
            image,
            &SweepOptions {
                seed: *seed,
                minicache_lines: *minicache_lines,
            },
            *json,
        ),
        Commands::Inspect {
            address,
            warm,
            cache,
            image,
            json,
        } => cmd_inspect(*address, warm, cache, image, *json),
    };

    if let Err(e) = result {
        eprintln!("[!] {e}");
        process::exit(1);
    }
}
