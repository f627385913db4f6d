//! Logical connection bookkeeping keyed by device address. A record only says
//! "we have associated with this address"; no socket is held open.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub address: String,
    /// Copied from the device auth token, empty when it had none
    pub session_id: String,
    pub last_activity: DateTime<Utc>,
}

/// Concurrent address → record map. DashMap shards its locks, so callers
/// working on different addresses do not contend with each other.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    records: DashMap<String, ConnectionRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate with `address`. The first caller creates the record; later
    /// callers find it and leave it untouched.
    pub fn connect(&self, address: &str, session_token: Option<&str>) -> bool {
        match self.records.entry(address.to_string()) {
            Entry::Occupied(_) => {
                info!(address = %address, "Already connected");
            }
            Entry::Vacant(slot) => {
                slot.insert(ConnectionRecord {
                    address: address.to_string(),
                    session_id: session_token.unwrap_or_default().to_string(),
                    last_activity: Utc::now(),
                });
                info!(address = %address, "Connected");
            }
        }
        true
    }

    /// Forget `address`. Returns true whether or not a record existed.
    pub fn disconnect(&self, address: &str) -> bool {
        if self.records.remove(address).is_some() {
            info!(address = %address, "Disconnected");
        }
        true
    }

    pub fn is_connected(&self, address: &str) -> bool {
        self.records.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<ConnectionRecord> {
        self.records.get(address).map(|r| r.value().clone())
    }

    /// Refresh last activity for an existing record
    pub fn touch(&self, address: &str) {
        if let Some(mut record) = self.records.get_mut(address) {
            record.last_activity = Utc::now();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_connect_is_idempotent() {
        let registry = ConnectionRegistry::new();

        assert!(registry.connect("10.0.0.5", Some("ABC")));
        assert!(registry.connect("10.0.0.5", Some("XYZ")));

        assert_eq!(registry.len(), 1);
        // first writer wins
        assert_eq!(registry.get("10.0.0.5").unwrap().session_id, "ABC");
    }

    #[test]
    fn test_connect_without_token() {
        let registry = ConnectionRegistry::new();
        registry.connect("10.0.0.5", None);
        assert_eq!(registry.get("10.0.0.5").unwrap().session_id, "");
    }

    #[test]
    fn test_disconnect() {
        let registry = ConnectionRegistry::new();
        registry.connect("10.0.0.5", None);

        assert!(registry.disconnect("10.0.0.5"));
        assert!(!registry.is_connected("10.0.0.5"));
        assert!(registry.is_empty());

        // unknown address still reports success
        assert!(registry.disconnect("10.0.0.99"));
    }

    #[test]
    fn test_touch_updates_activity() {
        let registry = ConnectionRegistry::new();
        registry.connect("10.0.0.5", None);
        let before = registry.get("10.0.0.5").unwrap().last_activity;

        std::thread::sleep(std::time::Duration::from_millis(5));
        registry.touch("10.0.0.5");

        assert!(registry.get("10.0.0.5").unwrap().last_activity > before);
    }

    #[test]
    fn test_touch_does_not_create() {
        let registry = ConnectionRegistry::new();
        registry.touch("10.0.0.5");
        assert!(!registry.is_connected("10.0.0.5"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connects_same_address() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for i in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let token = format!("token-{}", i);
                registry.connect("10.0.0.5", Some(&token))
            }));
        }

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap());
        }
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_addresses() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for i in 0..100 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let address = format!("10.0.1.{}", i);
                registry.connect(&address, None);
                if i % 2 == 0 {
                    registry.disconnect(&address);
                }
            }));
        }

        futures::future::join_all(handles).await;
        assert_eq!(registry.len(), 50);
        assert!(registry.is_connected("10.0.1.1"));
        assert!(!registry.is_connected("10.0.1.2"));
    }
}
