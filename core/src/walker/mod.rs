//! Per-family traversal of resource configs.
//!
//! Each walker rewrites tags in place and reports whether anything changed.
//! Walkers never touch the network; fetching and committing belong to the
//! controller.

mod dashboard;
mod monitor;
mod synthetic;

pub use dashboard::{DashboardWalker, UNSUPPORTED_WIDGET_TYPES};
pub use monitor::MonitorWalker;
pub use synthetic::SyntheticWalker;

use serde_json::Value;

use crate::errors::{Result, RetagError};
use crate::mapping::TagMapping;
use crate::query::rewrite_field;

pub trait ResourceWalker: Send + Sync {
    /// Rewrites every tag reference in `config` and returns whether any
    /// substitution happened.
    fn walk(&self, config: &mut Value, mapping: &TagMapping) -> Result<bool>;
}

/// Rewrites a top-level `query` string or `tags` list.
///
/// Absent and null fields are left alone; any other non-text value is a
/// structural error.
pub(crate) fn rewrite_tag_field(
    config: &mut Value,
    field: &str,
    mapping: &TagMapping,
) -> Result<bool> {
    if config.get(field).is_none_or(Value::is_null) {
        return Ok(false);
    }
    rewrite_field(config, field, mapping).ok_or_else(|| {
        RetagError::structural(format!("`{field}` is neither a string nor a list of strings"))
    })
}
