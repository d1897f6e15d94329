//! Service Metrics
//!
//! Prometheus collectors for discovery sweeps, pool placement and driver
//! dispatch, kept in a dedicated registry served by the metrics endpoint.

use crate::error::{Error, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Collectors shared by the discovery loop and the controller
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Discovery sweeps by outcome (`ok`, `report_failed`, `no_pool`)
    pub discovery_sweeps: IntCounterVec,
    /// Pools seen by the last successful sweep
    pub pools_discovered: IntGauge,
    /// Placement decisions by outcome
    pub placements: IntCounterVec,
    /// Driver operations by kind, operation and outcome
    pub provisions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("sds_placement".into()), None).map_err(prom)?;

        let discovery_sweeps = IntCounterVec::new(
            Opts::new("discovery_sweeps_total", "Discovery sweeps by outcome"),
            &["outcome"],
        )
        .map_err(prom)?;
        let pools_discovered = IntGauge::new(
            "pools_discovered",
            "Pools reported by the last discovery sweep",
        )
        .map_err(prom)?;
        let placements = IntCounterVec::new(
            Opts::new("placements_total", "Pool selections by outcome"),
            &["outcome"],
        )
        .map_err(prom)?;
        let provisions = IntCounterVec::new(
            Opts::new("provisions_total", "Driver operations by kind and outcome"),
            &["kind", "operation", "outcome"],
        )
        .map_err(prom)?;

        registry.register(Box::new(discovery_sweeps.clone())).map_err(prom)?;
        registry.register(Box::new(pools_discovered.clone())).map_err(prom)?;
        registry.register(Box::new(placements.clone())).map_err(prom)?;
        registry.register(Box::new(provisions.clone())).map_err(prom)?;

        Ok(Self {
            registry,
            discovery_sweeps,
            pools_discovered,
            placements,
            provisions,
        })
    }

    /// Render every collector in the text exposition format
    pub fn encode(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(prom)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

fn prom(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let metrics = Metrics::new().unwrap();
        metrics.discovery_sweeps.with_label_values(&["ok"]).inc();
        metrics.pools_discovered.set(3);
        metrics
            .provisions
            .with_label_values(&["Volume", "create", "ok"])
            .inc();

        let (content_type, body) = metrics.encode().unwrap();
        let body = String::from_utf8(body).unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(body.contains("sds_placement_discovery_sweeps_total{outcome=\"ok\"} 1"));
        assert!(body.contains("sds_placement_pools_discovered 3"));
    }

    #[test]
    fn test_registries_are_independent() {
        assert!(Metrics::new().is_ok());
        assert!(Metrics::new().is_ok());
    }
}
