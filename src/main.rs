use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{error, info};
use vsphere_monitor::config::Config;
use vsphere_monitor::error_report::{self, ErrorReporter};
use vsphere_monitor::inventory::vsphere::{SdkEndpoint, VSphereClient};
use vsphere_monitor::librato::LibratoClient;
use vsphere_monitor::reporter::HostAlarmReporter;
use vsphere_monitor::{scheduler, telemetry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    telemetry::init(config.json_logs).map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    let instance_id = config.resolved_instance_id();
    let error_reporter = match &config.error_report_url {
        Some(url) => Some(
            ErrorReporter::new(url, &config.environment, &instance_id)
                .context("couldn't create error reporter")?,
        ),
        None => None,
    };
    error_report::install_panic_hook(error_reporter.clone());

    info!(instance_id = %instance_id, version = env!("CARGO_PKG_VERSION"), "starting");

    if let Err(e) = run(&config).await {
        error!("fatal: {:#}", e);
        if let Some(reporter) = &error_reporter {
            reporter
                .capture(&reporter.event("fatal", format!("{:#}", e)))
                .await;
        }
        return Err(e);
    }

    info!("stopped");
    Ok(())
}

/// Set up both clients, resolve the clusters and report until shutdown.
async fn run(config: &Config) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let endpoint = SdkEndpoint::parse(&config.vsphere_url, &config.vsphere_api_release)
        .context("couldn't parse vSphere URL")?;
    let inventory = VSphereClient::connect(endpoint, config.vsphere_insecure)
        .await
        .context("couldn't create vSphere client")?;

    let librato = LibratoClient::with_url(
        &config.librato_url,
        &config.librato_email,
        &config.librato_token,
    )
    .context("couldn't create Librato client")?;

    let mut reporter = HostAlarmReporter::new(inventory, librato, config.alarm_metric_map())
        .with_metric_prefix(&config.metric_prefix);
    reporter
        .configure_clusters(&config.cluster_paths)
        .await
        .context("couldn't list hosts")?;

    scheduler::run(&reporter, config.report_interval(), scheduler::shutdown_signal()).await;
    Ok(())
}
