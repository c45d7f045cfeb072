//! Node Coordination Module
//!
//! The entry point for every command a node receives.
//!
//! ## Request Flow
//! 1. **Validation**: the command is checked before anything is locked.
//! 2. **Permission**: client commands are checked against the node's role
//!    (database create/drop needs the primary; `WritePolicy::PrimaryOnly`
//!    extends that to all writes).
//! 3. **Apply**: the local `TableStore` is mutated or read under the node's
//!    single exclusive lock.
//! 4. **Replication**: a client write accepted by a primary is handed to the
//!    broadcaster and the client is answered at once. Replicated commands are
//!    applied locally only, so they never bounce back.
//!
//! ## Submodules
//! - **`coordinator`**: `NodeCoordinator`, `Origin`, `WritePolicy`.
//! - **`handlers`**: axum handlers for the client and cluster endpoints.
//! - **`server`**: router assembly and node startup.

pub mod coordinator;
pub mod handlers;
pub mod server;

#[cfg(test)]
mod tests;
