pub mod vsphere;

use crate::errors::InventoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alarm ID -> current state, as returned for a single host.
pub type AlarmStates = HashMap<String, AlarmState>;

#[async_trait]
pub trait Inventory: Send + Sync {
    /// List the hosts under a fully qualified inventory path,
    /// e.g. "/datacenter/host/cluster".
    async fn list_hosts_in_cluster(&self, cluster_path: &str) -> Result<Vec<Host>, InventoryError>;

    /// Current state of every alarm defined on the host.
    async fn list_alarm_states_for_host(&self, host: &Host) -> Result<AlarmStates, InventoryError>;
}

/// A single ESXi host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Inventory name.
    pub name: String,
    /// Opaque handle into the inventory (managed object id).
    pub id: String,
}

impl Host {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Green,
    Yellow,
    Red,
    /// Unknown. Never reported.
    Gray,
}

impl AlarmState {
    /// Severity encoding used for gauges.
    pub fn metric_value(self) -> Option<i64> {
        match self {
            AlarmState::Green => Some(0),
            AlarmState::Yellow => Some(1),
            AlarmState::Red => Some(2),
            AlarmState::Gray => None,
        }
    }
}
