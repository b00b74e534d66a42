//! Lending kiosk - self-service book lending desk
//!
//! Wires the card reader, barcode scanner, catalog and display together and
//! runs lending transactions until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::signal;

use lending_kiosk::{
    config::AppConfig,
    devices::{ConsoleFeedback, LineCardReader, ShelfDisplay},
    input::AsyncLineSource,
    logging,
    repository::JsonCatalog,
    services::{KioskSession, LendingProcedure, LendingSettings},
};

/// Blocking stdin reads cannot be interrupted; don't wait on them forever.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let _log_guard = logging::init(&config.logging)?;

    tracing::info!("Starting lending kiosk v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    result
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let (barcodes, barcode_task) = AsyncLineSource::spawn(open_input(&config.input.barcode_path).await?);
    let barcode_terminator = barcodes.terminator();
    tracing::info!("Reading barcodes from {}", config.input.barcode_path);

    let (cards, card_task) = AsyncLineSource::spawn(open_input(&config.input.card_reader_path).await?);
    let card_terminator = cards.terminator();
    tracing::info!("Reading ID cards from {}", config.input.card_reader_path);

    let catalog = JsonCatalog::open(&config.catalog).await?;

    let session = KioskSession::new(Arc::new(ShelfDisplay::new(config.display.state_path.clone())));
    let mut procedure = LendingProcedure::new(
        Arc::new(LineCardReader::new(cards)),
        Arc::new(catalog),
        Arc::new(ConsoleFeedback::new()),
        barcodes,
        LendingSettings::from(&config.kiosk),
    );

    let signals = tokio::spawn({
        let session = session.clone();
        async move {
            shutdown_signal().await;
            session.terminate();
        }
    });

    session.run(&mut procedure).await;
    signals.abort();

    barcode_terminator.terminate();
    card_terminator.terminate();
    for (name, task) in [("barcode", barcode_task), ("card reader", card_task)] {
        if let Err(e) = task.await {
            tracing::warn!("{} reader task failed: {}", name, e);
        }
    }

    tracing::info!("Lending kiosk stopped");
    Ok(())
}

async fn open_input(path: &str) -> anyhow::Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(path).await?;
    Ok(Box::new(file))
}

/// Listen for SIGTERM (systemd stop) and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
