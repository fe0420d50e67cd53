use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for the swarm proxy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Host to bind the proxy server
    pub host: String,
    /// Port to bind the proxy server
    pub port: u16,
    /// Timeout for ordinary inference calls, in seconds
    pub request_timeout_secs: u64,
    /// Timeout for model-pull calls, in seconds
    pub pull_timeout_secs: u64,
}

impl ProxyConfig {
    pub fn new(host: String, port: u16, request_timeout_secs: u64, pull_timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            request_timeout_secs,
            pull_timeout_secs,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be non-zero".to_string());
        }
        if self.pull_timeout_secs == 0 {
            return Err("Pull timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 60,
            pull_timeout_secs: 600,
        }
    }
}

/// Body of `/register` and `/unregister`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostPayload {
    pub url: String,
}

/// Body of `/admin/pull`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelCommand {
    pub model: String,
}

/// Reply to a registry mutation: the outcome flag plus the resulting host list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MutationResponse {
    pub status: String,
    pub hosts: Vec<String>,
}

/// Reply to `/hosts`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsResponse {
    pub hosts: Vec<String>,
}

/// Per-host outcome map returned by the admin fan-out endpoints.
///
/// Values are either an opaque success payload (e.g. a model catalog) or a
/// `"failed: <reason>"` string for hosts that could not be reached.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FanoutResponse {
    pub results: BTreeMap<String, Value>,
}
