//! Pluggy Gateway
//!
//! HTTP gateway over the Pluggy open-banking API.
//!
//! ## Components
//!
//! 1. **Authenticated API Client** - caches one API key per instance and
//!    refreshes it shortly before expiry
//! 2. **Sandbox Item Poller** - waits for an item to reach a terminal status
//! 3. **Route adapters** - accounts, items, transactions, PIX, enrichment,
//!    sandbox and debug endpoints
//!
//! Every request builds its own client from shared configuration and a
//! shared transport, so credentials are never shared across requests.

pub mod api;
pub mod client;
pub mod common;
pub mod enrich;
pub mod poller;

// Re-exports: API client
pub use client::{
    CompositeAccountRef, Credential, HttpTransport, MemoryTransport, PluggyClient,
    SharedTransport, Transport, TransportError,
};

// Re-exports: poller
pub use poller::{wait_for_item, ItemSource, ItemState, WaitOptions, WaitOutcome};

// Re-exports: server
pub use api::{create_router, start_server, AppState, SharedAppState};

// Re-exports: infrastructure
pub use common::{GatewayConfig, GatewayError, Result};
