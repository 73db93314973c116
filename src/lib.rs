//! `braidstore`: the storage core of a distributed version-control
//! system — weave and knit per-file histories, a reconciler that
//! repairs derived indexes against the ground-truth revision graph, and
//! the graph queries (ancestry, unmerged-revision discovery, rename
//! detection) built on top of them.
//!
//! This crate is the engine room, not the porcelain: it has no notion
//! of a working tree, a commit message, or a CLI UX beyond the thin
//! `braid` binary built on top of it. Everything here operates on raw
//! rev-ids, file-ids, and line sequences.

pub mod config;
pub mod error;
pub mod graph;
pub mod knit;
pub mod lock;
pub mod reconcile;
pub mod transport;
pub mod util;
pub mod weave;

pub use error::{Error, ErrorKind, Result};
