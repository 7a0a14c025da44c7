//! RoxBridge CLI — exercise the bridge against a live scoring service without
//! the charting host.
//!
//! Commands:
//! - `probe` — one uncached request through the signal client
//! - `eval` — run host-shaped arrays through the full adapter, optionally repeated
//! - `config` — print the effective configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roxbridge_core::{
    BridgeConfig, CalcAdapter, CalcInput, CalcRequest, Instrument, SignalClient, SignalSource,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(
    name = "roxbridge",
    about = "RoxBridge CLI — remote-signal bridge diagnostics"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request to the scoring service, bypassing the cache.
    Probe {
        /// Instrument code. Omit to send the unknown placeholder.
        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        price: f64,

        #[arg(long)]
        vol: f64,
    },
    /// Run price/volume arrays through the adapter as the host would.
    Eval {
        /// Comma-separated prices, oldest first.
        #[arg(long, value_delimiter = ',', required = true)]
        prices: Vec<f32>,

        /// Comma-separated volumes, same length as prices.
        #[arg(long, value_delimiter = ',', required = true)]
        vols: Vec<f32>,

        /// Instrument code. Omit to send the unknown placeholder.
        #[arg(long)]
        code: Option<String>,

        /// Number of back-to-back invocations (shows cache behavior).
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Probe { code, price, vol } => run_probe(&config, code, price, vol),
        Commands::Eval {
            prices,
            vols,
            code,
            repeat,
        } => run_eval(&config, &prices, &vols, code.as_deref(), repeat),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

fn run_probe(config: &BridgeConfig, code: Option<String>, price: f64, vol: f64) -> Result<()> {
    let client = SignalClient::new(config);
    let req = CalcRequest::now(Instrument::from_label(code.as_deref()), price, vol);

    let started = Instant::now();
    let result = client.fetch_signal(&req);
    let elapsed = started.elapsed();

    match result {
        Ok(response) => {
            println!("{response}  ({} ms, {})", elapsed.as_millis(), client.url());
            Ok(())
        }
        Err(err) => {
            eprintln!("FAIL after {} ms: {err}", elapsed.as_millis());
            std::process::exit(1);
        }
    }
}

fn run_eval(
    config: &BridgeConfig,
    prices: &[f32],
    vols: &[f32],
    code: Option<&str>,
    repeat: u32,
) -> Result<()> {
    if prices.len() != vols.len() {
        bail!(
            "--prices has {} values but --vols has {}",
            prices.len(),
            vols.len()
        );
    }

    let adapter = CalcAdapter::new(SignalClient::new(config), config);
    let input = CalcInput::new(prices, vols, code);
    let mut out = vec![0.0_f32; prices.len()];

    for i in 0..repeat.max(1) {
        let started = Instant::now();
        let result = adapter.evaluate(&input, &mut out);
        let elapsed = started.elapsed();
        match result {
            Ok(Some(response)) => println!("[{}] {response} in {} us", i + 1, elapsed.as_micros()),
            Ok(None) => println!("[{}] empty input, nothing sent", i + 1),
            Err(err) => println!("[{}] no signal in {} us: {err}", i + 1, elapsed.as_micros()),
        }
    }

    println!("output: {out:?}");
    let stats = adapter.cache().stats();
    println!(
        "cache: {} fetches ({} failed), {} hits, {} suppressed; {} session(s)",
        stats.fetches,
        stats.failures,
        stats.hits,
        stats.suppressed,
        adapter.source().sessions_opened()
    );
    Ok(())
}
