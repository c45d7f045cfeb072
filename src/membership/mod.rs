//! Membership & Failover Module
//!
//! Tracks what this node is and whom it talks to, and decides when it has to
//! take over from the primary.
//!
//! ## Core Mechanisms
//! - **Runtime state**: `NodeRuntimeState` carries the node's role flag, its
//!   peers and the configured primary. It is injected into the coordinator and
//!   the monitor rather than read from globals.
//! - **Failure detection**: `FailureMonitor` polls the primary's `/ping` on an
//!   interval and promotes the local node after sustained failure.
//! - **No reconciliation**: promotion is one-way and uncoordinated. There is no
//!   term or epoch, so two replicas can both promote (split-brain).

pub mod monitor;
pub mod types;
