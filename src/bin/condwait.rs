use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use condwait::{file_exists, load_config, tcp_reachable, ConditionWaiter, HttpProbe, WaitError};

#[derive(Parser)]
#[command(name = "condwait")]
#[command(about = "Block until a TCP port, HTTP endpoint or file becomes available")]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Name used in log and failure messages
    #[arg(short, long)]
    label: Option<String>,

    /// Delay between checks in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long, value_name = "MS")]
    max_wait_ms: Option<u64>,

    #[command(subcommand)]
    target: Target,
}

#[derive(Subcommand)]
enum Target {
    /// Wait until HOST:PORT accepts TCP connections
    Tcp {
        addr: String,
        #[arg(long, default_value = "1000")]
        connect_timeout_ms: u64,
    },
    /// Wait until URL answers with a 2xx status
    Http {
        url: String,
        #[arg(long, default_value = "1000")]
        request_timeout_ms: u64,
    },
    /// Wait until PATH exists
    File { path: PathBuf },
}

impl Target {
    fn default_label(&self) -> String {
        match self {
            Target::Tcp { addr, .. } => addr.clone(),
            Target::Http { url, .. } => url.clone(),
            Target::File { path, .. } => path.display().to_string(),
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.apply_overrides(args.poll_interval_ms, args.max_wait_ms);
    config.validate().context("Invalid command line timings")?;

    let label = args
        .label
        .clone()
        .unwrap_or_else(|| args.target.default_label());
    let waiter = ConditionWaiter::with_config(config);
    log::info!(
        "Waiting for {label} (poll every {:?}, up to {:?})",
        waiter.config().poll_interval(),
        waiter.config().max_wait()
    );

    match args.target {
        Target::Tcp {
            addr,
            connect_timeout_ms,
        } => {
            let timeout = Duration::from_millis(connect_timeout_ms);
            waiter.wait(waiter.spec(label, || tcp_reachable(&addr, timeout)))?;
        }
        Target::Http {
            url,
            request_timeout_ms,
        } => {
            let probe = HttpProbe::new(url.clone(), Duration::from_millis(request_timeout_ms))?;
            waiter.wait(waiter.spec(label, || probe.check_server(&url)))?;
        }
        Target::File { path } => {
            waiter.wait(waiter.spec(label, || file_exists(&path)))?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("condwait: {e:#}");
            match e.downcast_ref::<WaitError>() {
                Some(wait_error) if wait_error.is_timeout() => ExitCode::from(1),
                _ => ExitCode::from(2),
            }
        }
    }
}
