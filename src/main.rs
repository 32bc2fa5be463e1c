//! Mercury - a lightweight authoritative and recursive DNS resolver with a
//! block-list sinkhole.
//!
//! Serves DNS over UDP, answering from the block-list, the response cache,
//! or authoritative zone files before falling back to iterative resolution
//! from the DNS root.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use mercury::server::{self, ServerConfig};

#[derive(Parser)]
#[command(name = "mercury")]
#[command(about = "Lightweight authoritative and recursive DNS resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve DNS queries over UDP
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = 53153)]
    port: u16,

    /// Enable authoritative zones
    #[arg(short = 'z', long, env = "ZONE")]
    zone: bool,

    /// Enable the block-list sinkhole
    #[arg(short = 's', long, env = "SINKHOLE")]
    sinkhole: bool,

    /// Directory of YAML zone files
    #[arg(long, default_value = "zones")]
    zones_dir: PathBuf,

    /// Block-list file, one name per line
    #[arg(long)]
    blocklist: Option<PathBuf>,

    /// Number of worker threads (default: 2 per CPU core)
    #[arg(short, long)]
    workers: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args),
    }
}

fn serve(args: ServeArgs) -> ExitCode {
    let bind_addr: SocketAddr = match format!("{}:{}", args.bind, args.port).parse() {
        Ok(addr) => addr,
        Err(error) => {
            error!(%error, "invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let workers = args.workers.unwrap_or_else(|| {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores * 2
    });

    let config = ServerConfig {
        bind_addr,
        zones_dir: args.zones_dir,
        blocklist_path: args.blocklist,
        zone_enabled: args.zone,
        sinkhole_enabled: args.sinkhole,
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(%error, "failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = runtime.block_on(server::run(config)) {
        error!(%error, "startup failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
