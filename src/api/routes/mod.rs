//! API Routes Module
//!
//! Route handlers organized by domain:
//! - health: service liveness
//! - accounts, items, transactions: read-only lookups
//! - pix: payment initiation
//! - enrich: rule-based transaction enrichment
//! - sandbox: sandbox item lifecycle
//! - debug: configuration and credential diagnostics

pub mod accounts;
pub mod debug;
pub mod enrich;
pub mod health;
pub mod items;
pub mod pix;
pub mod sandbox;
pub mod transactions;
