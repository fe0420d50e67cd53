//! Ollama Swarm Proxy
//!
//! A reverse proxy that load-balances inference requests across a dynamically
//! registered pool of backend inference hosts. Hosts register and unregister
//! themselves at runtime; requests are distributed round-robin with automatic
//! failover to the next untried host, and backend responses are streamed back
//! to the caller unmodified.

pub mod error;
pub mod registry;
pub mod router;
pub mod types;

pub use error::ProxyError;
pub use registry::HostPool;
pub use router::SwarmProxy;
pub use types::ProxyConfig;
