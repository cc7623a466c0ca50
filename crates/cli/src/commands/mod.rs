//! Command implementations.
//!
//! Each command takes the loaded configuration plus its arguments and returns
//! a serializable output document.

pub mod classify;
pub mod invalidate;
pub mod purge;

pub use classify::{ClassifyArgs, classify_impl};
pub use invalidate::{CategorySavedArgs, InvalidateArgs, category_saved_impl, invalidate_impl, purge_all_impl};
pub use purge::{FlushOriginArgs, PurgeArgs, flush_origin_impl, purge_impl};

use serde::Serialize;

pub fn to_json<T: Serialize>(output: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}
