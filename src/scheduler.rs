use crate::inventory::Inventory;
use crate::librato::MetricsSink;
use crate::reporter::HostAlarmReporter;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Call `report` once per `period` until `shutdown` resolves. The first
/// report runs immediately. A report that overruns the period delays the
/// next one; reports never overlap. Returns the number of completed reports.
pub async fn run<I, M, F>(reporter: &HostAlarmReporter<I, M>, period: Duration, shutdown: F) -> u64
where
    I: Inventory,
    M: MetricsSink,
    F: Future<Output = ()>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(interval_secs = period.as_secs(), "starting report loop");

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(ticks, "shutdown requested, stopping report loop");
                return ticks;
            }
            _ = ticker.tick() => {
                let summary = reporter.report(Utc::now()).await;
                ticks += 1;
                debug!(?summary, "tick finished");
            }
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
