//! Meridian command-line client.
//!
//! Submits transactions described in JSON files, fetches per-module
//! stats, and flushes metrics on a running server.
//!
//! ```bash
//! # Submit a transaction
//! meridian --host db0 --port 2021 txn order.json
//!
//! # Scheduler stats at verbosity 1
//! meridian stats scheduler 1
//!
//! # Flush all metrics
//! meridian metrics
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use meridian_proto::api::{response, ModuleId};
use meridian_proto::{Request, Transaction};

mod remote;
mod request;

use remote::ServerConnection;

/// Command-line client for a Meridian server
#[derive(Parser, Debug)]
#[command(name = "meridian", version, about = "Meridian client")]
struct Args {
    /// Server hostname
    #[arg(long, default_value = "localhost", env = "MERIDIAN_HOST")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 2021, env = "MERIDIAN_PORT")]
    port: u16,

    /// Send the txn command this many times
    #[arg(long, default_value_t = 1)]
    repeat: u64,

    /// Don't wait for replies
    #[arg(long, default_value_t = false)]
    no_wait: bool,

    /// Truncate long listings after this many lines
    #[arg(long, default_value_t = 50)]
    truncate: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit the transaction described in a JSON file
    Txn {
        /// Path to the transaction description
        file: PathBuf,
    },
    /// Print a module's stats
    Stats {
        /// One of: server, forwarder, sequencer, scheduler
        module: String,
        /// Verbosity level
        #[arg(default_value_t = 0)]
        level: u64,
    },
    /// Flush metrics
    Metrics {
        /// Only metrics with this prefix
        #[arg(default_value = ".")]
        prefix: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Txn { file } => execute_txn(args, file),
        Command::Stats { module, level } => execute_stats(args, module, *level),
        Command::Metrics { prefix } => execute_metrics(args, prefix),
    }
}

fn connect(args: &Args) -> Result<ServerConnection> {
    info!(host = %args.host, port = args.port, "connecting");
    ServerConnection::connect(&args.host, args.port)
        .with_context(|| format!("cannot connect to {}:{}", args.host, args.port))
}

fn execute_txn(args: &Args, file: &PathBuf) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("could not open {}", file.display()))?;
    let doc: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("could not parse json in {}", file.display()))?;
    let txn = request::build_transaction(&doc)?;
    info!(keys = txn.keys.len(), "transaction built");

    let mut connection = connect(args)?;
    for _ in 0..args.repeat {
        connection.send(&Request::txn(txn.clone()))?;
    }

    if args.no_wait {
        return Ok(());
    }
    for _ in 0..args.repeat {
        let response = connection.recv().context("malformed response")?;
        match response.r#type {
            Some(response::Type::Txn(txn_response)) => {
                match txn_response.txn {
                    Some(txn) => print_txn(&txn, args.truncate),
                    None => bail!("response carried no transaction"),
                }
            }
            other => bail!("unexpected response payload: {other:?}"),
        }
    }
    Ok(())
}

fn print_txn(txn: &Transaction, truncate: usize) {
    println!("id:     {}", txn.id());
    println!("status: {:?}", txn.status());
    if !txn.abort_reason.is_empty() {
        println!("abort reason: {}", txn.abort_reason);
    }
    for procedure in txn.procedures() {
        println!("code:   {}", procedure.args.join(" "));
    }
    println!("keys:");
    for entry in txn.keys.iter().take(truncate) {
        println!(
            "  {:?} {:?} home={} value={} bytes",
            meridian_common::Key::from_raw(entry.key.clone()),
            entry.key_type(),
            entry.home,
            entry.value().len(),
        );
    }
    if txn.keys.len() > truncate {
        println!("  (truncated)");
    }

    let events = txn.internal.as_ref().map(|i| &i.events[..]).unwrap_or(&[]);
    if !events.is_empty() {
        println!("{:<40}{:>8}{:>22}{:>7}", "Tracing event", "Machine", "Time", "Home");
        for event in events.iter().take(truncate) {
            println!(
                "{:<40}{:>8}{:>22}{:>7}",
                event.event, event.machine, event.time, event.home
            );
        }
    }
}

fn execute_stats(args: &Args, module: &str, level: u64) -> Result<()> {
    let module_id = match module {
        "server" => ModuleId::Server,
        "forwarder" => ModuleId::Forwarder,
        "sequencer" => ModuleId::Sequencer,
        "scheduler" => ModuleId::Scheduler,
        other => bail!("invalid module: {other}. modules are: server, forwarder, sequencer, scheduler"),
    };

    let mut connection = connect(args)?;
    connection.send(&Request::stats(module_id, level))?;
    if args.no_wait {
        return Ok(());
    }

    let response = connection.recv().context("malformed response")?;
    match response.r#type {
        Some(response::Type::Stats(stats)) => {
            let parsed: serde_json::Value = serde_json::from_str(&stats.stats_json)
                .context("server returned unparsable stats json")?;
            let pretty = serde_json::to_string_pretty(&parsed)?;
            for (count, line) in pretty.lines().enumerate() {
                if count >= args.truncate {
                    println!("(truncated)");
                    break;
                }
                println!("{line}");
            }
            Ok(())
        }
        other => bail!("unexpected response payload: {other:?}"),
    }
}

fn execute_metrics(args: &Args, prefix: &str) -> Result<()> {
    let mut connection = connect(args)?;
    connection.send(&Request::metrics(prefix))?;
    if args.no_wait {
        return Ok(());
    }
    let response = connection.recv().context("malformed response")?;
    match response.r#type {
        Some(response::Type::Metrics(_)) => {
            info!("metrics flushed");
            Ok(())
        }
        other => bail!("unexpected response payload: {other:?}"),
    }
}
