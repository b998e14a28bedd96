//! dirroute: serve an axum app from a directory of route manifests.
//!
//! ```text
//! api/
//! ├── parentMiddleware.toml      default = "request_log"
//! ├── health/route.toml          GET = "health"
//! └── users/[id]/route.toml      GET = "echo"   →  GET /api/users/:id
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::net::TcpListener;

use dirroute::config::{load_config, AppConfig};
use dirroute::lifecycle::{mount_routes, start_metrics, start_reload, wait_for_signal, Shutdown};
use dirroute::observability::logging;
use dirroute::{builtin_catalog, AppServer};

const DEFAULT_CONFIG_FILE: &str = "dirroute.toml";

#[derive(Debug, Parser)]
#[command(name = "dirroute", version, about = "Directory-convention HTTP routes")]
struct Cli {
    /// Config file (defaults to ./dirroute.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory scanned for route manifests.
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Reload routes when their manifests change.
    #[arg(long)]
    dev: bool,

    /// Address to listen on.
    #[arg(long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mount routes and serve them (default).
    Serve,
    /// Print the resolved route table and exit.
    Routes,
}

impl Cli {
    fn load_config(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                load_config(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AppConfig::default(),
        };

        if let Some(base_dir) = &self.base_dir {
            config.routes.base_dir = base_dir.clone();
        }
        if self.dev {
            config.routes.dev_mode = true;
        }
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dirroute starting");

    // The recorder must exist before mounting so startup counters are kept.
    let serving = !matches!(cli.command, Some(Command::Routes));
    if serving {
        start_metrics(&config.observability);
    }

    let catalog = builtin_catalog(&config.auth);
    let (registrar, report) = mount_routes(&config.routes, catalog)?;

    if !serving {
        let failures: Vec<_> = report
            .failures
            .iter()
            .map(|f| json!({ "file": f.file, "error": f.error.to_string() }))
            .collect();
        let table = json!({
            "routes": registrar.registry().summaries(),
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    let shutdown = Shutdown::new();
    let watcher = start_reload(&config.routes, &registrar, &shutdown)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        routes = registrar.registry().len(),
        dev_mode = config.routes.dev_mode,
        "Listening for connections"
    );

    let server = AppServer::new(&config.server, registrar.registry());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    if let Some(watcher) = watcher {
        watcher.await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
