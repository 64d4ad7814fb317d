use crate::transport::TransportSettings;
use rasmus_core::{DeliveryScheme, KeySpace, DEFAULT_RESPONSE_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub store_address: String,
    pub password: Option<String>,
    pub namespace: Option<String>,
    /// Connect/IO timeout, also used as the reconnect backoff
    pub timeout_secs: u64,
    /// How long a single BRPOP may block
    pub poll_wait_secs: u64,
    /// Completed responses buffered ahead of the publisher
    pub response_capacity: usize,
    pub delivery: DeliveryScheme,
    pub response_ttl_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            store_address: "127.0.0.1:6379".to_string(),
            password: None,
            namespace: None,
            timeout_secs: 10,
            poll_wait_secs: 5,
            response_capacity: 20,
            delivery: DeliveryScheme::Namespaced,
            response_ttl_secs: DEFAULT_RESPONSE_TTL_SECS,
        }
    }
}

impl WorkerConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WorkerConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Zero timeouts are raised to one second so a failed dial never spins
    pub fn transport_settings(&self) -> TransportSettings {
        let timeout = Duration::from_secs(self.timeout_secs.max(MIN_TIMEOUT_SECS));
        TransportSettings {
            backoff: timeout,
            io_timeout: timeout,
            poll_wait: Duration::from_secs(self.poll_wait_secs),
            password: self.password.clone().filter(|p| !p.is_empty()),
        }
    }

    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(self.namespace.clone())
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }
}
