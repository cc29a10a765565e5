use crate::config::DEFAULT_METRIC_PREFIX;
use crate::errors::ReporterError;
use crate::inventory::{Host, Inventory};
use crate::librato::{self, Gauge, Measurements, MetricsSink};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument, warn};

/// metric name -> source -> severity value, for a single tick.
pub type AlarmValues = BTreeMap<String, BTreeMap<String, i64>>;

/// Hosts found under one configured inventory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub path: String,
    pub hosts: Vec<Host>,
}

/// Alarm values gathered from every reachable host.
#[derive(Debug, Clone, Default)]
pub(crate) struct Collected {
    pub values: AlarmValues,
    pub hosts_polled: usize,
    pub hosts_failed: usize,
}

/// Outcome of one tick, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub hosts_polled: usize,
    pub hosts_failed: usize,
    pub gauges: usize,
    pub submitted: bool,
}

/// Reports the current state of host alarms to a metrics sink.
pub struct HostAlarmReporter<I, M> {
    inventory: I,
    sink: M,
    alarm_metric_names: HashMap<String, String>,
    metric_prefix: String,
    clusters: Vec<Cluster>,
}

impl<I: Inventory, M: MetricsSink> HostAlarmReporter<I, M> {
    pub fn new(inventory: I, sink: M, alarm_metric_names: HashMap<String, String>) -> Self {
        Self {
            inventory,
            sink,
            alarm_metric_names,
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            clusters: Vec::new(),
        }
    }

    pub fn with_metric_prefix(mut self, metric_prefix: impl Into<String>) -> Self {
        self.metric_prefix = metric_prefix.into();
        self
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Resolve every cluster path to its hosts. Full inventory paths are
    /// required, e.g. "/my-datacenter/host/my-cluster". The cluster set is
    /// only replaced if every path resolves.
    pub async fn configure_clusters(&mut self, cluster_paths: &[String]) -> Result<(), ReporterError> {
        if cluster_paths.is_empty() {
            return Err(ReporterError::NoClusters);
        }

        info!("getting list of hosts");

        let mut clusters: Vec<Cluster> = Vec::with_capacity(cluster_paths.len());
        for cluster_path in cluster_paths {
            let cluster_name = cluster_name_from_path(cluster_path);
            if cluster_name.is_empty() {
                return Err(ReporterError::InvalidClusterPath {
                    cluster_path: cluster_path.clone(),
                });
            }
            if let Some(existing) = clusters.iter().find(|c| c.name == cluster_name) {
                return Err(ReporterError::DuplicateCluster {
                    cluster_name: cluster_name.to_string(),
                    first_path: existing.path.clone(),
                    second_path: cluster_path.clone(),
                });
            }

            info!(cluster_name, cluster_path = %cluster_path, "getting list of hosts in cluster");
            let hosts = self
                .inventory
                .list_hosts_in_cluster(cluster_path)
                .await
                .map_err(|source| ReporterError::ListHosts {
                    cluster_name: cluster_name.to_string(),
                    cluster_path: cluster_path.clone(),
                    source,
                })?;

            clusters.push(Cluster {
                name: cluster_name.to_string(),
                path: cluster_path.clone(),
                hosts,
            });
        }

        let host_count: usize = clusters.iter().map(|c| c.hosts.len()).sum();
        info!(host_count, "found hosts");

        self.clusters = clusters;
        Ok(())
    }

    /// Fetch the alarm states of every host and submit them as one batch
    /// stamped with `now`. Failures are logged, never propagated.
    #[instrument(skip_all, fields(measure_time = now.timestamp()))]
    pub async fn report(&self, now: DateTime<Utc>) -> TickSummary {
        let collected = self.collect_values().await;
        let measurements = build_measurements(&self.metric_prefix, &collected.values, now);

        let mut summary = TickSummary {
            hosts_polled: collected.hosts_polled,
            hosts_failed: collected.hosts_failed,
            gauges: measurements.gauges.len(),
            submitted: false,
        };

        if measurements.gauges.is_empty() {
            warn!(
                hosts_polled = summary.hosts_polled,
                hosts_failed = summary.hosts_failed,
                "no measurements to send: every host failed or reported no mapped non-gray alarm"
            );
            return summary;
        }

        match self.sink.submit(&measurements).await {
            Ok(()) => {
                summary.submitted = true;
                info!(measurement_count = summary.gauges, "sent measurements to Librato");
            }
            Err(e) => error!(error = %e, "couldn't submit metrics to Librato"),
        }

        summary
    }

    /// Poll every host in order. A failing host is logged and skipped.
    /// Alarms sharing a metric name keep the highest severity per source.
    pub(crate) async fn collect_values(&self) -> Collected {
        let mut collected = Collected::default();

        for cluster in &self.clusters {
            for host in &cluster.hosts {
                collected.hosts_polled += 1;
                let source = metric_source(&cluster.name, &host.name);

                let alarm_states = match self.inventory.list_alarm_states_for_host(host).await {
                    Ok(states) => states,
                    Err(e) => {
                        collected.hosts_failed += 1;
                        error!(
                            cluster_name = %cluster.name,
                            host = %host.name,
                            error = %e,
                            "error getting alarm states for host"
                        );
                        continue;
                    }
                };

                for (alarm_id, state) in alarm_states {
                    let (Some(value), Some(metric_name)) =
                        (state.metric_value(), self.alarm_metric_names.get(&alarm_id))
                    else {
                        continue;
                    };

                    collected
                        .values
                        .entry(metric_name.clone())
                        .or_default()
                        .entry(source.clone())
                        .and_modify(|current| *current = (*current).max(value))
                        .or_insert(value);
                }
            }
        }

        collected
    }
}

/// Final path segment, ignoring a trailing slash.
pub fn cluster_name_from_path(cluster_path: &str) -> &str {
    cluster_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

pub fn metric_source(cluster_name: &str, host_name: &str) -> String {
    format!("{}-{}", cluster_name, host_name)
}

/// Flatten per-metric values into gauges sharing one timestamp. Metrics
/// without sources produce nothing; sources Librato would reject are dropped.
pub fn build_measurements(metric_prefix: &str, values: &AlarmValues, now: DateTime<Utc>) -> Measurements {
    let mut gauges = Vec::new();

    for (metric_name, sources) in values {
        let name = format!("{}.{}", metric_prefix, metric_name);
        for (source, value) in sources {
            if let Err(reason) = librato::validate_name(source) {
                warn!(source = %source, reason = %reason, "dropping measurement with invalid source");
                continue;
            }

            gauges.push(Gauge {
                name: name.clone(),
                value: *value as f64,
                source: source.clone(),
            });
        }
    }

    debug!(gauge_count = gauges.len(), "built measurements");

    Measurements {
        measure_time: now.timestamp(),
        gauges,
    }
}
