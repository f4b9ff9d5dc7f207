//! CAN Signal Decoder CLI Application
//!
//! This is the command-line interface for the CAN signal decoder.
//! It uses the can-signal-decoder library and adds:
//! - candump log reading
//! - Parallel decoding of several logs
//! - Text and JSON-lines output

use anyhow::{Context, Result};
use can_signal_decoder::{Decoder, Device};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod candump;
mod config;
mod output;

use config::AppConfig;
use output::OutputFormat;

/// CAN Signal Decoder - Decode MoTeC telemetry from CAN logs
#[derive(Parser, Debug)]
#[command(name = "can-signal-cli")]
#[command(about = "Decode MoTeC ECU/PDM/logger signals from candump logs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to candump log file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Path to signal table file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    signals: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for decoded signals (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only decode these CAN IDs (hex, can be repeated)
    #[arg(long, value_name = "ID", value_parser = parse_can_id)]
    filter: Vec<u32>,

    /// Also print frames no signal matched
    #[arg(long)]
    all_frames: bool,

    /// Maximum number of frames to decode per log
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Print the known device identifiers and exit
    #[arg(long)]
    list_devices: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Signal Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_signal_decoder::VERSION);

    if args.list_devices {
        list_devices();
        return Ok(());
    }

    let config = merge_config(&args)?;

    if config.input.signal_tables.is_empty() && config.input.logs.is_empty() {
        // No input - show help
        println!("CAN Signal Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  can-signal-cli --signals motec.toml --log run.log");
        println!("  can-signal-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let decoder = load_decoder(&config)?;
    decode_logs(&decoder, &config, args.max_frames)
}

/// Combine the optional config file with command-line overrides
fn merge_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    config.input.logs.extend(args.log.iter().cloned());
    config.input.signal_tables.extend(args.signals.iter().cloned());

    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    if !args.filter.is_empty() {
        config.decoder.message_filter = Some(args.filter.clone());
    }
    if args.all_frames {
        config.decoder.emit_undecoded_frames = true;
    }

    Ok(config)
}

/// Build the decoder and load every signal table
fn load_decoder(config: &AppConfig) -> Result<Decoder> {
    let mut decoder = Decoder::with_config(config.decoder.clone());

    for table in &config.input.signal_tables {
        decoder
            .add_signal_table(table)
            .with_context(|| format!("Error loading signal table {:?}", table))?;
    }

    let stats = decoder.registry_stats();
    log::info!(
        "Signal registry: {} signals on {} CAN IDs",
        stats.num_descriptors,
        stats.num_identifiers
    );
    Ok(decoder)
}

/// Decode all logs in parallel and write the results in input order
fn decode_logs(decoder: &Decoder, config: &AppConfig, max_frames: Option<usize>) -> Result<()> {
    let format = config.output.format;

    // The decoder is only read from here on, so the workers share it
    let rendered: Vec<Vec<String>> = config
        .input
        .logs
        .par_iter()
        .map(|path| -> Result<Vec<String>> {
            let frames = candump::read_log(path)?;
            let limit = max_frames.unwrap_or(usize::MAX);

            let mut lines = Vec::new();
            for logged in frames.into_iter().take(limit) {
                if let Some(decoded) = decoder.process_frame(logged.frame) {
                    for e in &decoded.errors {
                        log::warn!("{:?}: {}", path, e);
                    }
                    lines.extend(output::render(
                        format,
                        logged.timestamp,
                        logged.interface.as_deref(),
                        &decoded,
                    ));
                }
            }
            Ok(lines)
        })
        .collect::<Result<_>>()?;

    let mut out: Box<dyn Write> = match &config.output.path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    for line in rendered.iter().flatten() {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    Ok(())
}

fn list_devices() {
    println!("{:<12} {:>8}", "Device", "CAN ID");
    for device in Device::all() {
        println!("{:<12} {:>#8X}", device.name(), device.identifier());
    }
}

/// Parse a CAN ID given as hex, with or without a 0x prefix
fn parse_can_id(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid CAN ID {:?}: {}", s, e))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_can_id() {
        assert_eq!(parse_can_id("7F0"), Ok(0x7F0));
        assert_eq!(parse_can_id("0x118"), Ok(0x118));
        assert!(parse_can_id("xyz").is_err());
    }

    #[test]
    fn test_merge_config_overrides() {
        let args = Args::parse_from([
            "can-signal-cli",
            "--signals",
            "motec.toml",
            "--log",
            "run.log",
            "--format",
            "json",
            "--filter",
            "0x7F0",
            "--all-frames",
        ]);

        let config = merge_config(&args).unwrap();
        assert_eq!(config.input.signal_tables, vec![PathBuf::from("motec.toml")]);
        assert_eq!(config.input.logs, vec![PathBuf::from("run.log")]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.decoder.message_filter, Some(vec![0x7F0]));
        assert!(config.decoder.emit_undecoded_frames);
    }

    #[test]
    fn test_decode_logs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("motec.toml");
        let log = dir.path().join("run.log");
        let out = dir.path().join("out.txt");

        std::fs::write(
            &table,
            r#"
                [[signal]]
                name = "CoolantTemp"
                device = "ECU_1"
                start_bit = 0
                bitmask = 0xFF
                type = "uint8"
                unit = "C"
            "#,
        )
        .unwrap();
        std::fs::write(&log, "(1.000000) can0 118#5A\n(1.100000) can0 123#00\n").unwrap();

        let mut config = AppConfig::default();
        config.input.signal_tables.push(table);
        config.input.logs.push(log);
        config.output.path = Some(out.clone());

        let decoder = load_decoder(&config).unwrap();
        decode_logs(&decoder, &config, None).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            written,
            "[1970-01-01T00:00:01.000000Z] can0 0x118 (ECU_1)  CoolantTemp = 90 C\n"
        );
    }

    #[test]
    fn test_decode_logs_survives_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("motec.toml");
        let good = dir.path().join("good.log");
        let mixed = dir.path().join("mixed.log");
        let out = dir.path().join("out.txt");

        std::fs::write(
            &table,
            r#"
                [[signal]]
                name = "CoolantTemp"
                device = "ECU_1"
                start_bit = 0
                bitmask = 0xFF
                type = "uint8"
            "#,
        )
        .unwrap();
        std::fs::write(&good, "(1.000000) can0 118#5A\n").unwrap();
        std::fs::write(
            &mixed,
            "(2.000000) can0 118#5B\n(2.100000) can0 123##1AABB\n(2.200000) can0 118#5C\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.input.signal_tables.push(table);
        config.input.logs.extend([good, mixed]);
        config.output.path = Some(out.clone());

        let decoder = load_decoder(&config).unwrap();
        decode_logs(&decoder, &config, None).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("CoolantTemp = 90"));
        assert!(lines[1].ends_with("CoolantTemp = 91"));
        assert!(lines[2].ends_with("CoolantTemp = 92"));
    }
}
