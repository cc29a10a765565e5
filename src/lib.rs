//! Polls vSphere host alarm states and reports them to Librato as gauges.

pub mod config;
pub mod error_report;
pub mod errors;
pub mod inventory;
pub mod librato;
pub mod reporter;
pub mod scheduler;
pub mod telemetry;

#[cfg(test)]
mod test_support;
