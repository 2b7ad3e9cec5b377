use std::sync::Arc;

use swapwatch::config::{self, Config};
use swapwatch::logger::{self, LogTag};
use swapwatch::monitor::SwapMonitor;
use swapwatch::quotes::QuoteClient;
use swapwatch::rpc::RpcClient;
use swapwatch::shutdown::{self, Shutdown};
use swapwatch::utils::short_id;
use swapwatch::workflow::WatchWorkflow;

/// Entry point: load configuration, wire the monitor, spawn a watch
/// workflow per tracked mint and run until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() {
    logger::init();

    let args = config::parse_args();
    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(error) => {
            logger::error(LogTag::Config, &format!("Configuration error: {}", error));
            std::process::exit(1);
        }
    };

    logger::info(
        LogTag::System,
        &format!(
            "swapwatch starting: wallet {}, {} tracked mint(s)",
            short_id(&config.wallet_address),
            config.tracked_mints.len()
        ),
    );

    let shutdown = Shutdown::new();
    if let Err(error) = shutdown::install_signal_handlers(&shutdown) {
        logger::error(
            LogTag::System,
            &format!("Failed to install signal handlers: {}", error),
        );
        std::process::exit(1);
    }

    let rpc = match RpcClient::new(&config.rpc_url) {
        Ok(rpc) => Arc::new(rpc),
        Err(error) => {
            logger::error(LogTag::Rpc, &format!("Failed to build RPC client: {}", error));
            std::process::exit(1);
        }
    };
    let quotes = match QuoteClient::new() {
        Ok(quotes) => Arc::new(quotes),
        Err(error) => {
            logger::error(LogTag::Quotes, &format!("Failed to build quote client: {}", error));
            std::process::exit(1);
        }
    };

    let monitor = Arc::new(SwapMonitor::new(
        &config,
        Arc::clone(&rpc),
        vec![],
        shutdown.clone(),
    ));

    let workflow = Arc::new(WatchWorkflow::new(Arc::clone(&monitor), rpc, quotes));
    for mint in &config.tracked_mints {
        let workflow = Arc::clone(&workflow);
        let config = config.clone();
        let mint = mint.clone();
        tokio::spawn(async move {
            workflow.watch(&mint, &config).await;
        });
    }

    monitor.run().await;
    logger::info(LogTag::System, "Shutdown complete");
}
