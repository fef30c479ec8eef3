use serde_json::Value;

use super::{ResourceWalker, rewrite_tag_field};
use crate::errors::Result;
use crate::mapping::TagMapping;

/// Rewrites a monitor's `query` string and `tags` list independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorWalker;

impl ResourceWalker for MonitorWalker {
    fn walk(&self, config: &mut Value, mapping: &TagMapping) -> Result<bool> {
        let query_changed = rewrite_tag_field(config, "query", mapping)?;
        let tags_changed = rewrite_tag_field(config, "tags", mapping)?;
        Ok(query_changed || tags_changed)
    }
}
