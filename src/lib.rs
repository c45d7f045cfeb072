//! Replicated Table Store Library
//!
//! A minimal multi-node data store: one primary accepts writes and fans them
//! out to replicas over HTTP; replicas watch the primary and take over when
//! it stops answering. All data lives in memory.
//!
//! ## Architecture Modules
//! - **`storage`**: the in-memory tables and their mutation contract.
//! - **`command`**: the command vocabulary, its validation and the HTTP DTOs.
//! - **`node`**: the per-node coordinator that serializes access to the store,
//!   plus the axum handlers and startup wiring.
//! - **`replication`**: fire-and-forget fan-out of primary writes to peers.
//! - **`membership`**: role state and the failure monitor that drives
//!   self-promotion.
//! - **`config`**: the static cluster file and runtime settings.
//! - **`error`**: the shared error taxonomy.

pub mod command;
pub mod config;
pub mod error;
pub mod membership;
pub mod node;
pub mod replication;
pub mod storage;
