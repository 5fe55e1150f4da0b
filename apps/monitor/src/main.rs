use std::sync::Arc;

use anyhow::Result;
use market::{PollScheduler, PriceClient, WatchlistStore};
use monitor::{
    Data,
    command::{self, Reply},
    config::Config,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let watchlist = Arc::new(WatchlistStore::load(&config.watchlist_path).await?);
    let price_client = PriceClient::new(
        config.api_base_url.clone(),
        &config.api_key,
        config.request_timeout,
    )?;

    let scheduler = Arc::new(
        PollScheduler::new(
            Arc::new(price_client),
            Arc::clone(&watchlist),
            config.history_capacity,
        )
        .with_poll_interval(config.poll_interval)
        .with_focus_interval(config.history_refresh)
        .with_history_days(config.history_days),
    );

    let poller = tokio::spawn(Arc::clone(&scheduler).run());

    let data = Data {
        watchlist: Arc::clone(&watchlist),
        scheduler,
        history_days: config.history_days,
    };

    info!(
        symbols = watchlist.len().await,
        path = %config.watchlist_path.display(),
        "monitor ready, type `help` for commands"
    );

    tokio::select! {
        _ = console(&data) => {},
        _ = shutdown_signal() => {},
    }

    poller.abort();

    if let Err(e) = watchlist.save().await {
        error!(error = ?e, "final watchlist save failed");
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn console(data: &Data) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = ?e, "reading stdin failed");
                break;
            }
        };

        match command::dispatch(data, &line).await {
            Ok(Reply::Output(out)) if out.is_empty() => {}
            Ok(Reply::Output(out)) => println!("{out}"),
            Ok(Reply::Quit) => break,
            Err(e) => println!("Error: {e:#}"),
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
