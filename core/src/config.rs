//! Run configuration loading.
//!
//! The run config is a JSON document, `configs.json` by default:
//!
//! ```json
//! {
//!   "tags": { "env:staging": "env:production" },
//!   "dashboards": ["abc-def-ghi"],
//!   "monitors": ["*"],
//!   "synthetics": []
//! }
//! ```
//!
//! A family list that is absent or contains `"*"` selects every resource of
//! that family, an empty list skips the family, anything else is an id
//! allow-list. Monitor ids may be written as numbers.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, RetagError};
use crate::family::Family;
use crate::mapping::TagMapping;

pub const DEFAULT_CONFIG_FILE: &str = "configs.json";

const WILDCARD: &str = "*";

/// Dry-run or mutating execution, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Walk every resource and list what would change; never writes.
    #[default]
    Report,
    /// Walk every resource and write back the ones that changed.
    Commit,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Commit => "commit",
        }
    }
}

impl FromStr for RunMode {
    type Err = RetagError;

    /// Accepts `report`/`commit` and the older `test`/`prod` spellings.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "test" => Ok(Self::Report),
            "commit" | "prod" => Ok(Self::Commit),
            other => Err(RetagError::config(format!(
                "unknown run mode `{other}` (expected report/test or commit/prod)"
            ))),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resources of one family a run touches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
    Skip,
}

impl Selection {
    fn from_list(list: Option<Vec<ResourceIdToken>>) -> Self {
        let Some(list) = list else {
            return Self::All;
        };
        if list.is_empty() {
            return Self::Skip;
        }
        let ids: BTreeSet<String> = list.into_iter().map(ResourceIdToken::into_id).collect();
        if ids.contains(WILDCARD) {
            Self::All
        } else {
            Self::Only(ids)
        }
    }

    pub fn includes(&self, id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(id),
            Self::Skip => false,
        }
    }
}

/// Ids appear as strings for dashboards and synthetics and as numbers for
/// monitors.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ResourceIdToken {
    Text(String),
    Number(u64),
}

impl ResourceIdToken {
    fn into_id(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRunConfig {
    tags: Option<TagMapping>,
    dashboards: Option<Vec<ResourceIdToken>>,
    monitors: Option<Vec<ResourceIdToken>>,
    synthetics: Option<Vec<ResourceIdToken>>,
}

/// Tag mapping plus per-family selection for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub tags: TagMapping,
    pub dashboards: Selection,
    pub monitors: Selection,
    pub synthetics: Selection,
}

impl RunConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: RawRunConfig = serde_json::from_str(contents)
            .map_err(|e| RetagError::config_with_source("failed to parse run config", e))?;
        let tags = raw.tags.ok_or_else(|| {
            RetagError::config("`tags` field is required in the run config")
        })?;
        Ok(Self {
            tags,
            dashboards: Selection::from_list(raw.dashboards),
            monitors: Selection::from_list(raw.monitors),
            synthetics: Selection::from_list(raw.synthetics),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RetagError::config_with_source(format!("cannot read run config {}", path.display()), e)
        })?;
        let cfg = Self::from_json(&contents)?;
        tracing::debug!(
            path = %path.display(),
            mappings = cfg.tags.len(),
            "loaded run config"
        );
        Ok(cfg)
    }

    pub fn selection(&self, family: Family) -> &Selection {
        match family {
            Family::Dashboards => &self.dashboards,
            Family::Monitors => &self.monitors,
            Family::Synthetics => &self.synthetics,
        }
    }
}
