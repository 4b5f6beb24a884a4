use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::client::PoolPilotClient;

/// Devices configured by the host, keyed by host name.
///
/// Owned by the host and handed to whatever runs the "check all
/// connections" operation; the crate keeps no global list.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, Arc<PoolPilotClient>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device. Returns the client previously stored under `host`.
    pub fn insert(
        &mut self,
        host: impl Into<String>,
        client: Arc<PoolPilotClient>,
    ) -> Option<Arc<PoolPilotClient>> {
        self.devices.insert(host.into(), client)
    }

    pub fn remove(&mut self, host: &str) -> Option<Arc<PoolPilotClient>> {
        self.devices.remove(host)
    }

    pub fn get(&self, host: &str) -> Option<&Arc<PoolPilotClient>> {
        self.devices.get(host)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Probe every device in turn.
    pub async fn check_all(&self) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for (host, client) in &self.devices {
            let ok = client.check_connection().await;
            info!(host = host.as_str(), ok, "connectivity check");
            results.insert(host.clone(), ok);
        }
        results
    }
}
