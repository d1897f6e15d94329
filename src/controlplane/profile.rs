//! Profile Resolution

use crate::domain::PersistenceClientRef;
use crate::error::{Error, Result};
use crate::model::{ProfileSpec, DEFAULT_PROFILE_NAME};
use tracing::{debug, warn};

/// Looks up the profile a request names, or the tenant default
#[derive(Clone)]
pub struct ProfileResolver {
    store: PersistenceClientRef,
}

impl ProfileResolver {
    pub fn new(store: PersistenceClientRef) -> Self {
        Self { store }
    }

    /// Resolve `profile_id`; an empty id means the default profile
    pub async fn resolve(&self, profile_id: &str) -> Result<ProfileSpec> {
        let (lookup, label) = if profile_id.is_empty() {
            warn!("Use default profile when user doesn't specify profile");
            (self.store.get_default_profile().await, DEFAULT_PROFILE_NAME)
        } else {
            (self.store.get_profile(profile_id).await, profile_id)
        };

        let profile = lookup.map_err(|e| Error::ProfileResolution {
            profile: label.to_string(),
            reason: e.to_string(),
        })?;
        debug!(profile = %profile.name, id = %profile.id, "Resolved profile");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PersistenceClient;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_resolve() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ProfileResolver::new(store.clone());

        assert_matches!(
            resolver.resolve("").await,
            Err(Error::ProfileResolution { profile, .. }) if profile == "default"
        );

        let default = store.create_profile(ProfileSpec::new("default")).await.unwrap();
        let gold = store.create_profile(ProfileSpec::new("gold")).await.unwrap();

        assert_eq!(resolver.resolve("").await.unwrap().id, default.id);
        assert_eq!(resolver.resolve(&gold.id).await.unwrap().name, "gold");
        assert_matches!(
            resolver.resolve("missing").await,
            Err(Error::ProfileResolution { profile, .. }) if profile == "missing"
        );
    }
}
