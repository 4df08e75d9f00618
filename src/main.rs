//! # tup900-edge CLI
//!
//! Runs the edge printer agent, or talks to the printer once from the shell.
//!
//! ## Usage
//!
//! ```bash
//! # Run the agent (HTTP control-plane surface on :8080)
//! tup900-edge serve --device /dev/usb/lp1
//!
//! # Same, against an in-memory printer
//! tup900-edge serve --simulate
//!
//! # One-shot operations
//! tup900-edge print --name Ada
//! tup900-edge status
//! tup900-edge recover
//!
//! # Inspect the bytes a job would send
//! tup900-edge encode --name Ada
//! tup900-edge encode --name Ada --out job.bin
//! tup900-edge commands
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tup900_edge::{
    AgentError, ConfigHandle, Dispatcher,
    dispatch::{
        ControlPlane, Identity, MethodResponse,
        control::{HttpControlPlane, LogControlPlane},
    },
    printer::DEFAULT_PRINTER_PATH,
    protocol::{
        commands::{catalog, to_hex},
        job,
        text::TextPolicy,
    },
    server::{self, ServerConfig},
    transport::{FileOpener, MemoryOpener},
    worker::DeviceWorker,
};

/// TUP900 edge printer agent
#[derive(Parser, Debug)]
#[command(name = "tup900-edge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command that reaches the printer.
#[derive(Args, Debug)]
struct AgentArgs {
    /// Printer device path
    #[arg(long, env = "PRINTER_PATH", default_value = DEFAULT_PRINTER_PATH)]
    device: String,

    /// Device identity reported in responses
    #[arg(long, env = "IOTEDGE_DEVICEID", default_value = "unknown")]
    device_id: String,

    /// Module identity
    #[arg(long, env = "IOTEDGE_MODULEID", default_value = "unknown")]
    module_id: String,

    /// Bound on the status read, in milliseconds
    #[arg(long, default_value = "2000")]
    read_timeout_ms: u64,

    /// Bound on draining one job into the device, in milliseconds
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,

    /// What to do with characters outside printable ASCII
    /// (replace, strip, transliterate, reject)
    #[arg(long, default_value = "replace")]
    text_policy: TextPolicy,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent
    Serve {
        #[command(flatten)]
        agent: AgentArgs,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Forward events and reported properties to this base URL
        #[arg(long, env = "UPSTREAM_URL")]
        upstream_url: Option<String>,

        /// Use an in-memory printer instead of the device node
        #[arg(long)]
        simulate: bool,
    },

    /// Print the greeting job once
    Print {
        #[command(flatten)]
        agent: AgentArgs,

        /// Name to greet
        #[arg(long)]
        name: String,
    },

    /// Read the printer status once
    Status {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Force presenter recovery once
    Recover {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Encode a job without printing it
    Encode {
        /// Name to greet
        #[arg(long)]
        name: String,

        /// Write raw bytes to FILE instead of printing hex
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// What to do with characters outside printable ASCII
        #[arg(long, default_value = "replace")]
        text_policy: TextPolicy,
    },

    /// List the command catalog
    Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, AgentError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            agent,
            listen,
            upstream_url,
            simulate,
        } => {
            let control: Arc<dyn ControlPlane> = match upstream_url {
                Some(url) => {
                    let upstream = HttpControlPlane::new(url);
                    info!(upstream = %upstream.base_url(), "Forwarding to upstream control plane");
                    Arc::new(upstream)
                }
                None => Arc::new(LogControlPlane),
            };

            let dispatcher = Arc::new(build_dispatcher(&agent, control, simulate));
            let identity = dispatcher.identity();
            info!(
                "Module '{}'-'{}' initialized",
                identity.device_id, identity.module_id
            );
            dispatcher.report_current().await;

            server::serve(ServerConfig { listen_addr: listen }, dispatcher).await?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Print { agent, name } => {
            let payload = serde_json::json!({ "name": name }).to_string();
            one_shot(&agent, "print", payload.as_bytes()).await
        }

        Commands::Status { agent } => one_shot(&agent, "status", b"{}").await,

        Commands::Recover { agent } => one_shot(&agent, "recover", b"{}").await,

        Commands::Encode {
            name,
            out,
            text_policy,
        } => {
            let bytes = job::encode(&name, text_policy)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => println!("{}", to_hex(&bytes)),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Commands => {
            for code in catalog() {
                println!("{:<24} {}", code.name, to_hex(code.bytes));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_dispatcher(agent: &AgentArgs, control: Arc<dyn ControlPlane>, simulate: bool) -> Dispatcher {
    let read_timeout = Duration::from_millis(agent.read_timeout_ms);
    let device = if simulate {
        warn!("Simulation mode: using an in-memory printer");
        DeviceWorker::spawn(MemoryOpener::simulated(), read_timeout)
    } else {
        let write_timeout = Duration::from_millis(agent.write_timeout_ms);
        DeviceWorker::spawn(FileOpener::new(write_timeout), read_timeout)
    };

    let config = ConfigHandle::default();
    config.apply_device_path(Some(agent.device.as_str()));

    Dispatcher::new(
        Identity::new(&agent.device_id, &agent.module_id),
        config,
        device,
        control,
    )
    .with_text_policy(agent.text_policy)
}

/// Invoke one method against the real device and print the response body.
async fn one_shot(agent: &AgentArgs, method: &str, payload: &[u8]) -> Result<ExitCode, AgentError> {
    let dispatcher = build_dispatcher(agent, Arc::new(LogControlPlane), false);
    let response: MethodResponse = dispatcher.invoke(method, payload).await;

    println!("{}", String::from_utf8_lossy(&response.payload));
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} returned {}", method, response.status);
        Ok(ExitCode::FAILURE)
    }
}
