//! Filter Requests
//!
//! A filter request is the ordered set of predicates one placement decision
//! evaluates. It is seeded from a profile's custom properties and then
//! completed with the base rules every request carries.

use super::predicate::{DataStorageField, FieldPath, IoConnectivityField, Predicate};
use crate::error::Result;
use crate::model::{ProfileSpec, ResourceSpec, StoragePoolSpec, DEFAULT_AVAILABILITY_ZONE};
use indexmap::IndexMap;

/// The parts of a resource request that drive placement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementRequest {
    /// Size in GiB
    pub size: u64,
    /// Empty means the default zone
    pub availability_zone: String,
    /// Optional pool hint
    pub pool_id: String,
}

impl PlacementRequest {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn with_availability_zone(mut self, az: impl Into<String>) -> Self {
        self.availability_zone = az.into();
        self
    }

    pub fn with_pool_id(mut self, pool_id: impl Into<String>) -> Self {
        self.pool_id = pool_id.into();
        self
    }
}

impl From<&ResourceSpec> for PlacementRequest {
    fn from(res: &ResourceSpec) -> Self {
        Self {
            size: res.size,
            availability_zone: res.availability_zone.clone(),
            pool_id: res.pool_id.clone(),
        }
    }
}

/// Ordered predicates, one per pool field
#[derive(Debug, Clone, Default)]
pub struct FilterRequest {
    predicates: IndexMap<FieldPath, Predicate>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the request for placing `request` under `profile`.
    ///
    /// Base rules overwrite custom properties on the same field.
    pub fn build(profile: &ProfileSpec, request: &PlacementRequest) -> Result<Self> {
        let mut filter = Self::new();

        if let Some(custom) = &profile.custom_properties {
            for (key, value) in custom {
                filter.insert(Predicate::from_json(FieldPath::parse(key), value)?);
            }
        }

        filter.insert(Predicate::ge(FieldPath::FreeCapacity, request.size));

        let az = if request.availability_zone.is_empty() {
            DEFAULT_AVAILABILITY_ZONE
        } else {
            request.availability_zone.as_str()
        };
        filter.insert(Predicate::eq_text(FieldPath::AvailabilityZone, az));

        if !request.pool_id.is_empty() {
            filter.insert(Predicate::eq_text(FieldPath::Id, request.pool_id.clone()));
        }

        let ds = &profile.provisioning_properties.data_storage;
        if !ds.is_empty() {
            filter.insert(Predicate::is(
                FieldPath::DataStorage(DataStorageField::IsSpaceEfficient),
                ds.is_space_efficient,
            ));
            if let Some(policy) = ds.provisioning_policy {
                filter.insert(Predicate::eq_text(
                    FieldPath::DataStorage(DataStorageField::ProvisioningPolicy),
                    policy.to_string(),
                ));
            }
            if ds.recovery_time_objective != 0 {
                filter.insert(Predicate::le(
                    FieldPath::DataStorage(DataStorageField::RecoveryTimeObjective),
                    ds.recovery_time_objective,
                ));
            }
        }

        let io = &profile.provisioning_properties.io_connectivity;
        if !io.is_empty() {
            if !io.access_protocol.is_empty() {
                filter.insert(Predicate::eq_text(
                    FieldPath::IoConnectivity(IoConnectivityField::AccessProtocol),
                    io.access_protocol.clone(),
                ));
            }
            if io.max_iops != 0 {
                filter.insert(Predicate::ge(
                    FieldPath::IoConnectivity(IoConnectivityField::MaxIops),
                    io.max_iops,
                ));
            }
            if io.max_bws != 0 {
                filter.insert(Predicate::ge(
                    FieldPath::IoConnectivity(IoConnectivityField::MaxBws),
                    io.max_bws,
                ));
            }
        }

        Ok(filter)
    }

    /// Add a predicate, replacing any previous one on the same field
    pub fn insert(&mut self, predicate: Predicate) {
        self.predicates.insert(predicate.field.clone(), predicate);
    }

    pub fn get(&self, field: &FieldPath) -> Option<&Predicate> {
        self.predicates.get(field)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    /// Whether every predicate holds for `pool`
    pub fn matches(&self, pool: &StoragePoolSpec) -> Result<bool> {
        for predicate in self.predicates.values() {
            if !predicate.matches(pool)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::ProvisioningPolicy;
    use crate::placement::predicate::Operator;
    use assert_matches::assert_matches;

    fn keys(filter: &FilterRequest) -> Vec<String> {
        filter.iter().map(|p| p.field.key()).collect()
    }

    #[test]
    fn test_base_rules_only() {
        let filter =
            FilterRequest::build(&ProfileSpec::new("default"), &PlacementRequest::new(10)).unwrap();

        assert_eq!(keys(&filter), vec!["freeCapacity", "availabilityZone"]);
        let az = filter.get(&FieldPath::AvailabilityZone).unwrap();
        assert_eq!(az.to_string(), "== default");
    }

    #[test]
    fn test_pool_hint_and_zone() {
        let request = PlacementRequest::new(1)
            .with_availability_zone("az1")
            .with_pool_id("p-1");
        let filter = FilterRequest::build(&ProfileSpec::new("default"), &request).unwrap();

        assert_eq!(filter.get(&FieldPath::Id).unwrap().to_string(), "== p-1");
        assert_eq!(
            filter.get(&FieldPath::AvailabilityZone).unwrap().to_string(),
            "== az1"
        );
    }

    #[test]
    fn test_provisioning_properties() {
        let mut profile = ProfileSpec::new("gold");
        let ds = &mut profile.provisioning_properties.data_storage;
        ds.provisioning_policy = Some(ProvisioningPolicy::Thin);
        ds.recovery_time_objective = 60;
        let io = &mut profile.provisioning_properties.io_connectivity;
        io.access_protocol = "iscsi".into();
        io.max_iops = 1000;

        let filter = FilterRequest::build(&profile, &PlacementRequest::new(5)).unwrap();
        assert_eq!(
            keys(&filter),
            vec![
                "freeCapacity",
                "availabilityZone",
                "extras.dataStorage.isSpaceEfficient",
                "extras.dataStorage.provisioningPolicy",
                "extras.dataStorage.recoveryTimeObjective",
                "extras.ioConnectivity.accessProtocol",
                "extras.ioConnectivity.maxIOPS",
            ]
        );

        let sef = filter
            .get(&FieldPath::DataStorage(DataStorageField::IsSpaceEfficient))
            .unwrap();
        assert_eq!(sef.op, Operator::Is);
        assert_eq!(sef.to_string(), "<is> false");
        let rto = filter
            .get(&FieldPath::DataStorage(DataStorageField::RecoveryTimeObjective))
            .unwrap();
        assert_eq!(rto.op, Operator::Le);
    }

    #[test]
    fn test_custom_properties_seed_and_are_overridden() {
        let mut profile = ProfileSpec::new("custom");
        let mut custom = crate::model::CustomProperties::new();
        custom.insert("diskType".into(), serde_json::json!("SSD"));
        custom.insert("freeCapacity".into(), serde_json::json!(">= 1"));
        profile.custom_properties = Some(custom);

        let filter = FilterRequest::build(&profile, &PlacementRequest::new(50)).unwrap();
        assert_eq!(
            keys(&filter),
            vec!["extras.advanced.diskType", "freeCapacity", "availabilityZone"]
        );
        assert_eq!(
            filter.get(&FieldPath::FreeCapacity).unwrap().to_string(),
            ">= 50"
        );
    }

    #[test]
    fn test_empty_custom_properties() {
        let mut profile = ProfileSpec::new("custom");
        profile.custom_properties = Some(Default::default());
        let filter = FilterRequest::build(&profile, &PlacementRequest::new(1)).unwrap();
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_malformed_custom_property() {
        let mut profile = ProfileSpec::new("custom");
        let mut custom = crate::model::CustomProperties::new();
        custom.insert("latency".into(), serde_json::json!("<= fast"));
        profile.custom_properties = Some(custom);

        assert_matches!(
            FilterRequest::build(&profile, &PlacementRequest::new(1)),
            Err(Error::InvalidFilterPredicate { .. })
        );
    }
}
