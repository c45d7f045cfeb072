//! Replication Module
//!
//! Asynchronous, fire-and-forget propagation of primary writes.
//!
//! A primary hands each accepted write to the `ReplicationBroadcaster`, which
//! spawns one short-lived task per peer. Delivery is unordered across peers
//! and across successive commands, failures are only logged, and a dropped
//! send leaves that replica permanently behind.

pub mod broadcaster;
