//! Resource families: endpoints, listing shapes and pre-commit cleanup.

use serde::Serialize;
use serde_json::Value;

use crate::api::ResourceApi;
use crate::errors::{Result, RetagError};
use crate::walker::{DashboardWalker, MonitorWalker, ResourceWalker, SyntheticWalker};

/// Server-managed dashboard fields rejected by the update endpoint.
pub const DASHBOARD_EXTRANEOUS_FIELDS: &[&str] = &[
    "author_name",
    "author_handle",
    "id",
    "url",
    "created_at",
    "modified_at",
];

/// Server-managed monitor fields rejected by the update endpoint.
pub const MONITOR_EXTRANEOUS_FIELDS: &[&str] = &[
    "deleted",
    "matching_downtimes",
    "id",
    "multi",
    "created",
    "created_at",
    "creator",
    "org_id",
    "modified",
    "overall_state_modified",
    "overall_state",
];

/// Server-managed synthetic test fields rejected by the update endpoint.
pub const SYNTHETIC_EXTRANEOUS_FIELDS: &[&str] = &["public_id", "monitor_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Dashboards,
    Monitors,
    Synthetics,
}

/// One entry from a family listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRef {
    pub id: String,
    /// The listing entry as returned by the API.
    pub summary: Value,
}

impl Family {
    /// Processing order for a full run.
    pub const ALL: [Family; 3] = [Self::Dashboards, Self::Monitors, Self::Synthetics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboards => "dashboards",
            Self::Monitors => "monitors",
            Self::Synthetics => "synthetics",
        }
    }

    /// Singular noun used in report lines.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Dashboards => "dashboard",
            Self::Monitors => "monitor",
            Self::Synthetics => "synthetic",
        }
    }

    pub fn list_path(&self) -> &'static str {
        match self {
            Self::Dashboards => "dashboard",
            Self::Monitors => "monitor",
            Self::Synthetics => "synthetics/tests",
        }
    }

    pub fn walker(&self) -> &'static dyn ResourceWalker {
        match self {
            Self::Dashboards => &DashboardWalker,
            Self::Monitors => &MonitorWalker,
            Self::Synthetics => &SyntheticWalker,
        }
    }

    pub fn extraneous_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Dashboards => DASHBOARD_EXTRANEOUS_FIELDS,
            Self::Monitors => MONITOR_EXTRANEOUS_FIELDS,
            Self::Synthetics => SYNTHETIC_EXTRANEOUS_FIELDS,
        }
    }

    /// Splits a listing response into resource references.
    ///
    /// Dashboards come wrapped in `{"dashboards": [...]}`, synthetics in
    /// `{"tests": [...]}`, and monitors as a bare array.
    pub fn parse_listing(&self, listing: Value) -> Result<Vec<ResourceRef>> {
        let (entries, id_field) = match (self, listing) {
            (Self::Dashboards, Value::Object(mut map)) => (map.remove("dashboards"), "id"),
            (Self::Monitors, list @ Value::Array(_)) => (Some(list), "id"),
            (Self::Synthetics, Value::Object(mut map)) => (map.remove("tests"), "public_id"),
            _ => (None, "id"),
        };
        let Some(Value::Array(entries)) = entries else {
            return Err(RetagError::structural(format!(
                "unexpected {} listing shape",
                self.as_str()
            )));
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, summary)| {
                let id = match summary.get(id_field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => {
                        return Err(RetagError::structural(format!(
                            "{} listing entry {index} has no `{id_field}`",
                            self.as_str()
                        )));
                    }
                };
                Ok(ResourceRef { id, summary })
            })
            .collect()
    }

    /// API path used both to fetch the full config and to update it.
    pub fn detail_path(&self, resource: &ResourceRef) -> Result<String> {
        match self {
            Self::Dashboards => Ok(format!("dashboard/{}", resource.id)),
            Self::Monitors => Ok(format!("monitor/{}", resource.id)),
            Self::Synthetics => match resource.summary.get("type").and_then(Value::as_str) {
                Some(kind @ ("browser" | "api")) => {
                    Ok(format!("synthetics/tests/{kind}/{}", resource.id))
                }
                other => Err(RetagError::structural(format!(
                    "synthetic test type {} has no update endpoint",
                    other.unwrap_or("<missing>")
                ))),
            },
        }
    }

    /// Full resource config to walk.
    ///
    /// The monitor listing already carries complete monitor bodies; the other
    /// families need a detail call.
    pub async fn fetch(
        &self,
        api: &dyn ResourceApi,
        resource: &ResourceRef,
        detail_path: &str,
    ) -> Result<Value> {
        match self {
            Self::Monitors => Ok(resource.summary.clone()),
            Self::Dashboards | Self::Synthetics => api.get(detail_path).await,
        }
    }

    /// Drops server-managed fields before a commit write.
    pub fn strip_extraneous(&self, config: &mut Value) {
        if let Some(map) = config.as_object_mut() {
            for field in self.extraneous_fields() {
                map.remove(*field);
            }
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
