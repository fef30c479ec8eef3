use serde_json::Value;

use super::{ResourceWalker, rewrite_tag_field};
use crate::errors::Result;
use crate::mapping::TagMapping;

/// Rewrites the `tags` list of a full synthetic test config.
///
/// Expects the per-test detail body; the list endpoint's summaries are
/// resolved by the controller before walking.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticWalker;

impl ResourceWalker for SyntheticWalker {
    fn walk(&self, config: &mut Value, mapping: &TagMapping) -> Result<bool> {
        rewrite_tag_field(config, "tags", mapping)
    }
}
