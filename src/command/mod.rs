//! Command Protocol Module
//!
//! The vocabulary shared by the client surface and the replica surface.
//!
//! ## Overview
//! - **`types`**: the tagged [`Command`](types::Command) enum, its per-kind
//!   validation and the read/write classification used for replication.
//! - **`protocol`**: endpoint paths and the request DTOs that convert into
//!   commands.
//!
//! There is no protocol versioning. A payload whose `action` tag is unknown is
//! rejected as `InvalidCommand` before it can be applied or replicated.

pub mod protocol;
pub mod types;
