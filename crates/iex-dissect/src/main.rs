//! iex-dissect - decode hex-encoded IEX-TP datagrams
//!
//! Reads one datagram per line from a file or stdin, or generates a synthetic
//! quote feed, and prints a summary of every segment.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iex_dissect::config::{AppConfig, CONFIG_ENV};
use iex_dissect::dissect::Dissector;
use iex_dissect::input::HexLines;
use iex_feed::synthetic::SyntheticGenerator;

/// IEX-TP datagram decoder
#[derive(Parser, Debug)]
#[command(name = "iex-dissect")]
#[command(version)]
#[command(about = "Decode hex-encoded IEX-TP segments and TOPS quotes", long_about = None)]
struct Args {
    /// Input file with one hex datagram per line; stdin if omitted or "-"
    input: Option<PathBuf>,

    /// Configuration file path (falls back to $IEX_DISSECT_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit one JSON object per segment
    #[arg(short, long)]
    json: bool,

    /// Print messages and anomalies under each segment
    #[arg(short, long)]
    detail: bool,

    /// Reject datagrams that do not look like transport segments
    #[arg(long)]
    strict: bool,

    /// Skip quote field validation
    #[arg(long)]
    no_validate: bool,

    /// Decode N generated datagrams instead of reading input
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    /// Seed for the synthetic feed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Print Prometheus counters to stderr when done
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::from_env().with_context(|| format!("loading ${CONFIG_ENV}"))?,
    };

    config.json |= args.json;
    config.detail |= args.detail;
    config.decoder.require_sniff |= args.strict;
    if args.no_validate {
        config.decoder.validate_quotes = false;
    }
    Ok(config)
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    tracing::debug!(name = %config.name, decoder = ?config.decoder, "configuration loaded");

    let stdout = io::stdout();
    let mut dissector = Dissector::new(&config, BufWriter::new(stdout.lock()));

    if let Some(n) = args.synthetic {
        tracing::info!(datagrams = n, seed = args.seed, "decoding synthetic feed");
        let mut generator = SyntheticGenerator::with_seed(config.synthetic.clone(), args.seed)
            .context("synthetic feed config")?;
        for line in 1..=n {
            let datagram = generator.next_datagram()?;
            dissector.process(line, &datagram)?;
        }
        tracing::info!(dropped = generator.dropped(), "synthetic feed done");
    } else {
        for datagram in HexLines::new(open_input(args.input.as_deref())?) {
            match datagram {
                Ok(d) => dissector.process(d.line, &d.bytes)?,
                Err(err) => tracing::warn!("{err:#}"),
            }
        }
    }

    tracing::info!(
        segments = dissector.metrics().segments_total.get(),
        errors = dissector.metrics().decode_errors_total.get(),
        conversations = dissector.conversations(),
        "done"
    );

    if args.metrics {
        let text = dissector.metrics().encode()?;
        io::stderr().write_all(text.as_bytes())?;
    }
    dissector.finish()?;
    Ok(())
}
