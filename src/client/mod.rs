//! Pluggy API Client
//!
//! Authenticated access to the upstream open-banking API.
//!
//! This module contains:
//! - The network transport seam (reqwest and in-memory)
//! - Credential caching and refresh
//! - Composite account reference parsing
//! - Typed request and response payloads
//! - The `PluggyClient` operations

pub mod credential;
pub mod memory;
pub mod pluggy;
pub mod reference;
pub mod transport;
pub mod types;

pub use credential::{AuthResponse, Credential, DEFAULT_TTL_MINUTES, EXPIRY_MARGIN_SECS};
pub use memory::MemoryTransport;
pub use pluggy::PluggyClient;
pub use reference::CompositeAccountRef;
pub use transport::{
    HttpTransport, SharedTransport, Transport, TransportError, UpstreamRequest, UpstreamResponse,
};
pub use types::{
    AuthDebugInfo, ListEnvelope, Pagination, PixTransferRequest, PixTransferResult,
    SandboxCredentials, SandboxItemParams, TransactionFilters, TransactionsResponse,
};
