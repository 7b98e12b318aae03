mod cli;
mod error;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edgemax_api::{EdgeMaxClient, StatSinks};
use edgemax_config::Settings;
use edgemax_exporter::{
    Collector, DpiCollector, Exporter, InterfacesCollector, SystemCollector, drain, server,
};

use crate::cli::Cli;
use crate::error::ExporterError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    let config = edgemax_config::load_config(cli.config.as_deref())?;
    let settings = edgemax_config::resolve(&config, cli.overrides())?;
    let url = settings.address.to_string();

    let client = EdgeMaxClient::new(&url, &settings.transport)
        .map_err(|e| ExporterError::from_login(&url, e))?;
    client
        .login(&settings.username, &settings.password)
        .await
        .map_err(|e| ExporterError::from_login(&url, e))?;
    if client.session_id().is_none() {
        warn!(%url, "no session cookie after login; the device may have rejected the credentials");
    }
    info!(%url, username = %settings.username, "logged in");

    serve_stats(&client, &settings).await
}

/// Subscribe, wire the stat channels to the collectors, and serve metrics
/// until interrupted or until the stream ends.
async fn serve_stats(client: &EdgeMaxClient, settings: &Settings) -> Result<(), ExporterError> {
    let url = settings.address.to_string();
    let namespace = settings.namespace.as_str();

    let system = Arc::new(SystemCollector::new(namespace));
    let dpi = Arc::new(DpiCollector::new(namespace));
    let interfaces = Arc::new(InterfacesCollector::new(namespace));

    let (system_tx, system_rx) = mpsc::channel(1);
    let (dpi_tx, dpi_rx) = mpsc::channel(1);
    let (interfaces_tx, interfaces_rx) = mpsc::channel(1);

    let drains = [
        tokio::spawn(drain(Arc::clone(&system), system_rx)),
        tokio::spawn(drain(Arc::clone(&dpi), dpi_rx)),
        tokio::spawn(drain(Arc::clone(&interfaces), interfaces_rx)),
    ];

    let collectors: Vec<Arc<dyn Collector>> = vec![system, dpi, interfaces];
    let exporter = Arc::new(Exporter::new(collectors));

    let listener = TcpListener::bind(settings.listen_address)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: settings.listen_address.to_string(),
            source,
        })?;

    let sinks = StatSinks {
        system: system_tx,
        dpi: dpi_tx,
        interfaces: interfaces_tx,
    };
    let stats = client
        .stats(sinks, &settings.stream)
        .await
        .map_err(|e| ExporterError::from_stream(&url, e))?;
    info!(%url, "subscribed to stats stream");

    let app = server::router(exporter, &settings.telemetry_path);

    let outcome = tokio::select! {
        result = server::serve(listener, app) => result.map_err(ExporterError::Server),
        () = stats.stopped() => {
            warn!("stats stream ended");
            Err(ExporterError::StreamEnded)
        }
        () = interrupted() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    };

    stats.stop().await;
    for task in drains {
        if let Err(e) = task.await {
            warn!(error = %e, "collector task failed");
        }
    }

    outcome
}

/// Resolves on Ctrl-C. Never resolves if the signal cannot be observed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
}
