//! Client code for shopedge.
//!
//! This crate provides the HTTP purge dispatcher that talks to edge nodes and
//! the invalidation orchestrator that turns content changes into purges.

pub mod invalidate;
pub mod purge;

pub use invalidate::{AdminNotice, Invalidator};
pub use purge::{PurgeClient, PurgeConfig, PurgeError, PurgeTarget};
