use thiserror::Error;

//create types errors for easy testability

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid alarm mapping {raw:?}: expected alarm-id:metric-name")]
    InvalidAlarmMapping { raw: String },

    #[error("invalid metric name {name:?}: {reason}")]
    InvalidMetricName { name: String, reason: String },

    #[error("invalid vSphere URL: {reason}")]
    InvalidVSphereUrl { reason: String },
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    #[error("login succeeded but no session id was returned")]
    MissingSession,

    #[error("inventory path {path} not found")]
    PathNotFound { path: String },

    #[error("inventory path {path} is a {kind}, not a cluster or host")]
    NotAComputeResource { path: String, kind: String },

    #[error("client has no alarm manager")]
    NoAlarmManager,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("error marshalling measurements to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("error creating HTTP request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("error while sending HTTP request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("metrics API returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("no cluster paths configured")]
    NoClusters,

    #[error("cluster path {cluster_path:?} has no cluster name")]
    InvalidClusterPath { cluster_path: String },

    #[error("cluster name {cluster_name} is used by both {first_path} and {second_path}")]
    DuplicateCluster {
        cluster_name: String,
        first_path: String,
        second_path: String,
    },

    #[error("error listing hosts in cluster {cluster_name} (path {cluster_path}): {source}")]
    ListHosts {
        cluster_name: String,
        cluster_path: String,
        source: InventoryError,
    },
}
