//! Dock and Pool Identity
//!
//! Ids are name-based UUIDs so every sweep on the same host derives the
//! same ids for the same backends and pools.

use std::fs;
use uuid::Uuid;

/// Id of the pool named `pool_name` on the dock at `endpoint` of `host`
pub fn pool_id(host: &str, endpoint: &str, pool_name: &str) -> String {
    let name = format!("{}:{}:{}", host, endpoint, pool_name);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Id of the dock serving `driver_name` on `host`
pub fn dock_id(host: &str, driver_name: &str) -> String {
    let name = format!("{}:{}", host, driver_name);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Resolve the host name, preferring an explicit override
pub fn hostname(override_name: Option<&str>) -> String {
    if let Some(name) = override_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    // Try /etc/hostname first
    if let Ok(hostname) = fs::read_to_string("/etc/hostname") {
        let hostname = hostname.trim();
        if !hostname.is_empty() {
            return hostname.to_string();
        }
    }

    // Fall back to hostname command
    #[cfg(unix)]
    {
        use std::process::Command;
        if let Ok(output) = Command::new("hostname").output() {
            if output.status.success() {
                let hostname = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !hostname.is_empty() {
                    return hostname;
                }
            }
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic() {
        let a = pool_id("host-1", "127.0.0.1:50050", "pool-a");
        assert_eq!(a, pool_id("host-1", "127.0.0.1:50050", "pool-a"));
        assert_ne!(a, pool_id("host-2", "127.0.0.1:50050", "pool-a"));
        assert_ne!(a, pool_id("host-1", "127.0.0.1:50050", "pool-b"));

        let d = dock_id("host-1", "sample");
        assert_eq!(d, dock_id("host-1", "sample"));
        assert_eq!(Uuid::parse_str(&d).unwrap().get_version_num(), 5);
    }

    #[test]
    fn test_hostname_override() {
        assert_eq!(hostname(Some(" node-a ")), "node-a");
        assert!(!hostname(Some("")).is_empty());
        assert!(!hostname(None).is_empty());
    }
}
