//! Table Storage Module
//!
//! The in-memory data model every node holds.
//!
//! ## Core Concepts
//! - **Table**: a column schema plus rows keyed by caller-supplied row ids.
//!   Every value is an opaque string; no typing is inferred.
//! - **TableStore**: the set of tables (and registered database names) owned by
//!   a single node. It is never shared between nodes and carries no locking of
//!   its own.
//! - **Mutation contract**: inserts must carry every declared column and
//!   overwrite on an existing id; updates merge keys into an existing row;
//!   deletes and updates on a missing id fail with `NotFound`.

pub mod memory;
pub mod table;
