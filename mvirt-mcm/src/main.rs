//! mvirt-mcm: run machine lifecycle requests against the mvirt control plane.
//!
//! Requests are read from JSON files (machine class, secret) and the response
//! is printed as JSON. Failures exit non-zero with the status code the
//! machine controller would see.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mvirt_mcm::api::{
    CreateMachineRequest, DeleteMachineRequest, GetMachineStatusRequest, ListMachinesRequest,
    Machine, MachineClass, Secret,
};
use mvirt_mcm::{Driver, DriverConfig, RequestContext, RestStore};

/// mvirt machine driver
#[derive(Parser, Debug)]
#[command(name = "mvirt-mcm", version, about)]
struct Args {
    /// mvirt API REST endpoint
    #[arg(long, default_value = "http://[::1]:8080")]
    endpoint: String,

    /// Namespace holding machine and secret objects
    #[arg(short, long, default_value = "default")]
    namespace: String,

    /// Provider name requests must carry
    #[arg(long, default_value = mvirt_mcm::config::DEFAULT_PROVIDER_NAME)]
    provider: String,

    /// Seconds between deletion confirmation polls
    #[arg(long, default_value = "5")]
    poll_interval: u64,

    /// Seconds to wait for a deleted machine to disappear
    #[arg(long, default_value = "600")]
    delete_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a machine
    Create(MachineArgs),
    /// Delete a machine and wait until it is gone
    Delete(MachineArgs),
    /// List machines of a class
    List(ClassArgs),
    /// Show provider ID and node name of a machine
    Status(MachineArgs),
}

#[derive(clap::Args, Debug)]
struct ClassArgs {
    /// Machine class JSON file
    #[arg(long)]
    class: PathBuf,

    /// Secret JSON file
    #[arg(long)]
    secret: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct MachineArgs {
    /// Machine name
    #[arg(long)]
    machine: String,

    #[command(flatten)]
    class: ClassArgs,
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn read_class(args: &ClassArgs) -> Result<(MachineClass, Option<Secret>)> {
    let class = read_json(&args.class).await?;
    let secret = match &args.secret {
        Some(path) => Some(read_json(path).await?),
        None => None,
    };
    Ok((class, secret))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mvirt_mcm=info,reqwest=warn,hyper=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = DriverConfig::new(args.namespace)
        .with_provider_name(args.provider)
        .with_polling(
            Duration::from_secs(args.poll_interval),
            Duration::from_secs(args.delete_timeout),
        );
    let store = Arc::new(RestStore::new(&args.endpoint).context("Invalid API endpoint")?);
    let driver = Driver::new(store, config).context("Invalid driver configuration")?;

    info!(
        "Using mvirt API {} (namespace {})",
        args.endpoint,
        driver.config().namespace
    );

    // SIGINT cancels the in-flight request
    let shutdown = CancellationToken::new();
    let ctx = RequestContext::with_cancel(shutdown.clone());
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received SIGINT, cancelling request");
            shutdown.cancel();
        }
    });

    let result = match args.command {
        Command::Create(m) => {
            let (class, secret) = read_class(&m.class).await?;
            let req = CreateMachineRequest {
                machine: Some(Machine::new(m.machine)),
                machine_class: Some(class),
                secret,
            };
            driver.create_machine(&ctx, req).await.map(|r| print_json(&r))
        }
        Command::Delete(m) => {
            let (class, secret) = read_class(&m.class).await?;
            let req = DeleteMachineRequest {
                machine: Some(Machine::new(m.machine)),
                machine_class: Some(class),
                secret,
            };
            driver.delete_machine(&ctx, req).await.map(|r| print_json(&r))
        }
        Command::List(c) => {
            let (class, secret) = read_class(&c).await?;
            let req = ListMachinesRequest {
                machine_class: Some(class),
                secret,
            };
            driver.list_machines(&ctx, req).await.map(|r| print_json(&r))
        }
        Command::Status(m) => {
            let (class, secret) = read_class(&m.class).await?;
            let req = GetMachineStatusRequest {
                machine: Some(Machine::new(m.machine)),
                machine_class: Some(class),
                secret,
            };
            driver
                .get_machine_status(&ctx, req)
                .await
                .map(|r| print_json(&r))
        }
    };

    match result {
        Ok(printed) => printed,
        Err(status) => anyhow::bail!("{:?}: {}", status.code(), status.message()),
    }
}
