//! Recover CRC parameters from captured samples.
//!
//! Samples are hex buffers whose trailing `ceil(width / 8)` bytes hold a
//! big-endian checksum. They come from the command line, from a file with
//! one sample per line, or both:
//!
//! ```text
//! crcsleuth-probe --width 16 313220b5 3132339752 31323334d789
//! crcsleuth-probe --width 16 --file idam.txt --fallback --json
//! ```
//!
//! Logging goes to stderr and is controlled by `CRCSLEUTH_LOG`.

mod input;

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crcsleuth::tracing::prelude::*;
use crcsleuth::{Catalogue, DetectConfig, Detector, DiscoveryResult, Normalization, PresetMatcher};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "crcsleuth-probe", version, about = "Recover CRC parameters from samples")]
struct Args {
    /// CRC width in bits
    #[arg(short, long)]
    width: u8,

    /// File with one hex sample per line; `#` starts a comment
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// JSON file with detection settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Known output XOR (hex); replaces the default guesses
    #[arg(long, value_parser = parse_xorout)]
    xorout: Option<u64>,

    /// Search generators with the top bit set instead of odd generators
    #[arg(long)]
    top_bit: bool,

    /// Retry with equal-length pairs when the normal search finds nothing
    #[arg(long)]
    fallback: bool,

    /// Evaluate candidates on one thread
    #[arg(long)]
    sequential: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Samples as hex strings
    samples: Vec<String>,
}

impl Args {
    /// Settings from the config file (or defaults) with flags applied on top.
    fn detect_config(&self) -> Result<DetectConfig> {
        let mut config = match &self.config {
            Some(path) => input::load_config(path)?,
            None => DetectConfig::default(),
        };
        if self.xorout.is_some() {
            config.xorout_hint = self.xorout;
        }
        if self.top_bit {
            config.normalization = Normalization::TopBit;
        }
        if self.fallback {
            config.same_length_fallback = true;
        }
        if self.sequential {
            config.parallel = false;
        }
        Ok(config)
    }

    fn collect_samples(&self) -> Result<Vec<Vec<u8>>> {
        let mut samples = match &self.file {
            Some(path) => input::read_sample_file(path)?,
            None => Vec::new(),
        };
        samples.extend(input::parse_sample_args(&self.samples)?);
        if samples.is_empty() {
            bail!("no samples given; pass hex samples or --file");
        }
        Ok(samples)
    }
}

fn parse_xorout(text: &str) -> Result<u64, String> {
    input::parse_hex_u64(text).map_err(|e| format!("{e:#}"))
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    result: &'a DiscoveryResult,
    preset_name: Option<&'a str>,
}

fn main() -> Result<ExitCode> {
    crcsleuth::tracing::init();
    let args = Args::parse();

    let config = args.detect_config()?;
    let samples = args.collect_samples()?;
    debug!(?config, samples = samples.len(), "Starting detection");

    let detector = Detector::new(config).with_presets(Catalogue::new());

    let mut last_decile = 0;
    let mut report_progress = |current: u64, total: u64| {
        let decile = (u128::from(current) * 10 / u128::from(total)) as u64;
        if decile > last_decile {
            last_decile = decile;
            debug!(percent = decile * 10, "Searching generators");
        }
        ControlFlow::Continue(())
    };

    let result = detector
        .detect_with_progress(&samples, args.width, &mut report_progress)
        .context("detection failed")?;
    let preset_name = result.preset.and_then(|i| detector.presets().preset_name(i));

    if args.json {
        let report = Report {
            result: &result,
            preset_name,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{result}");
        if let Some(name) = preset_name {
            println!("preset: {name}");
        }
    }

    Ok(if result.found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
