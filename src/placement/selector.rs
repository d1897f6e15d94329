//! Pool Selector
//!
//! Scans candidate pools in order and keeps the first ones that satisfy
//! every predicate of a filter request.

use super::request::{FilterRequest, PlacementRequest};
use crate::error::{Error, Result};
use crate::model::{ProfileSpec, StoragePoolSpec};
use tracing::{debug, info};

// =============================================================================
// Pool Selector
// =============================================================================

/// Stateless pool selection engine
pub struct PoolSelector;

impl PoolSelector {
    /// Return up to `max_num` pools satisfying `filter`, in input order.
    ///
    /// An empty result is `NoAvailablePool`; a predicate that can not be
    /// evaluated aborts the scan.
    pub fn select_supported_pools(
        max_num: usize,
        filter: &FilterRequest,
        pools: &[StoragePoolSpec],
    ) -> Result<Vec<StoragePoolSpec>> {
        let mut selected = Vec::new();

        for pool in pools {
            if selected.len() >= max_num {
                break;
            }
            if filter.matches(pool)? {
                debug!(pool = %pool.name, id = %pool.id, "pool matches filter");
                selected.push(pool.clone());
            }
        }

        if selected.is_empty() {
            debug!(
                candidates = pools.len(),
                predicates = filter.len(),
                "no pool satisfies filter"
            );
            return Err(Error::NoAvailablePool);
        }

        Ok(selected)
    }

    /// Build the filter request from `profile` and `request`, then select
    pub fn select_supported_pool(
        max_num: usize,
        profile: &ProfileSpec,
        request: &PlacementRequest,
        pools: &[StoragePoolSpec],
    ) -> Result<Vec<StoragePoolSpec>> {
        let filter = FilterRequest::build(profile, request)?;
        Self::select_supported_pools(max_num, &filter, pools)
    }

    /// Pick the single pool a new resource lands in
    pub fn select_one(
        profile: &ProfileSpec,
        request: &PlacementRequest,
        pools: &[StoragePoolSpec],
    ) -> Result<StoragePoolSpec> {
        let mut selected = Self::select_supported_pool(1, profile, request, pools)?;
        let pool = selected.swap_remove(0);
        info!(
            pool = %pool.name,
            id = %pool.id,
            profile = %profile.name,
            size = request.size,
            "selected pool"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomProperties, ProvisioningPolicy};
    use assert_matches::assert_matches;

    fn pool(id: &str, free: u64, az: &str) -> StoragePoolSpec {
        let mut pool = StoragePoolSpec::new(format!("pool-{}", id), free * 2, free);
        pool.id = id.into();
        pool.availability_zone = az.into();
        pool
    }

    fn ids(pools: &[StoragePoolSpec]) -> Vec<&str> {
        pools.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_first_fit_preserves_order() {
        let pools = vec![
            pool("a", 5, "default"),
            pool("b", 50, "default"),
            pool("c", 100, "default"),
        ];
        let profile = ProfileSpec::new("default");

        let selected =
            PoolSelector::select_supported_pool(2, &profile, &PlacementRequest::new(10), &pools)
                .unwrap();
        assert_eq!(ids(&selected), vec!["b", "c"]);

        let selected =
            PoolSelector::select_supported_pool(1, &profile, &PlacementRequest::new(10), &pools)
                .unwrap();
        assert_eq!(ids(&selected), vec!["b"]);
    }

    #[test]
    fn test_free_capacity_boundary() {
        let pools = vec![pool("a", 10, "default")];
        let profile = ProfileSpec::new("default");

        assert!(PoolSelector::select_one(&profile, &PlacementRequest::new(10), &pools).is_ok());
        assert_matches!(
            PoolSelector::select_one(&profile, &PlacementRequest::new(11), &pools),
            Err(Error::NoAvailablePool)
        );
    }

    #[test]
    fn test_zone_defaults() {
        let pools = vec![pool("a", 100, "az1"), pool("b", 100, "default")];
        let profile = ProfileSpec::new("default");

        let chosen = PoolSelector::select_one(&profile, &PlacementRequest::new(1), &pools).unwrap();
        assert_eq!(chosen.id, "b");

        let request = PlacementRequest::new(1).with_availability_zone("az1");
        let chosen = PoolSelector::select_one(&profile, &request, &pools).unwrap();
        assert_eq!(chosen.id, "a");
    }

    #[test]
    fn test_pool_hint() {
        let pools = vec![pool("a", 100, "default"), pool("b", 100, "default")];
        let profile = ProfileSpec::new("default");

        let request = PlacementRequest::new(1).with_pool_id("b");
        let chosen = PoolSelector::select_one(&profile, &request, &pools).unwrap();
        assert_eq!(chosen.id, "b");

        let request = PlacementRequest::new(1).with_pool_id("missing");
        assert_matches!(
            PoolSelector::select_one(&profile, &request, &pools),
            Err(Error::NoAvailablePool)
        );
    }

    #[test]
    fn test_provisioning_policy_and_iops() {
        let mut thick = pool("thick", 100, "default");
        thick.extras.data_storage.provisioning_policy = Some(ProvisioningPolicy::Thick);
        thick.extras.io_connectivity.max_iops = 10_000;
        let mut thin = pool("thin", 100, "default");
        thin.extras.data_storage.provisioning_policy = Some(ProvisioningPolicy::Thin);
        thin.extras.io_connectivity.max_iops = 500;
        let mut fast_thin = pool("fast-thin", 100, "default");
        fast_thin.extras.data_storage.provisioning_policy = Some(ProvisioningPolicy::Thin);
        fast_thin.extras.io_connectivity.max_iops = 5_000;
        let pools = vec![thick, thin, fast_thin];

        let mut profile = ProfileSpec::new("gold");
        profile.provisioning_properties.data_storage.provisioning_policy =
            Some(ProvisioningPolicy::Thin);
        profile.provisioning_properties.io_connectivity.max_iops = 1_000;

        let chosen = PoolSelector::select_one(&profile, &PlacementRequest::new(1), &pools).unwrap();
        assert_eq!(chosen.id, "fast-thin");
    }

    #[test]
    fn test_advanced_capability() {
        let mut ssd = pool("ssd", 100, "default");
        ssd.extras
            .advanced
            .insert("diskType".into(), serde_json::json!("SSD"));
        let pools = vec![pool("plain", 100, "default"), ssd];

        let mut custom = CustomProperties::new();
        custom.insert("diskType".into(), serde_json::json!("<or> NVMe <or> SSD"));
        let mut profile = ProfileSpec::new("fast");
        profile.custom_properties = Some(custom);

        let chosen = PoolSelector::select_one(&profile, &PlacementRequest::new(1), &pools).unwrap();
        assert_eq!(chosen.id, "ssd");
    }

    #[test]
    fn test_zero_and_empty() {
        let filter = FilterRequest::new();
        assert_matches!(
            PoolSelector::select_supported_pools(1, &filter, &[]),
            Err(Error::NoAvailablePool)
        );
        assert_matches!(
            PoolSelector::select_supported_pools(0, &filter, &[pool("a", 1, "default")]),
            Err(Error::NoAvailablePool)
        );
    }

    #[test]
    fn test_invalid_predicate_aborts() {
        let mut custom = CustomProperties::new();
        custom.insert("totalCapacity".into(), serde_json::json!("<is> true"));
        let mut profile = ProfileSpec::new("broken");
        profile.custom_properties = Some(custom);

        let pools = vec![pool("a", 100, "default")];
        assert_matches!(
            PoolSelector::select_one(&profile, &PlacementRequest::new(1), &pools),
            Err(Error::InvalidFilterPredicate { .. })
        );
    }
}
