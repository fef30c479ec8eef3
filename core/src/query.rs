//! Query node classification, extraction and write-back.
//!
//! A widget's `requests` value is either an array of request objects or an
//! object keyed by axis name (scatter plots, hostmaps). Each entry is
//! classified once into a [`QueryNode`]; the node resolves to a single JSON
//! pointer that both the extractor and the writer use, so the location read
//! and the location written can never diverge.

use serde_json::Value;

use crate::errors::{Result, RetagError};
use crate::mapping::TagMapping;
use crate::substitute::{TagPayload, substitute};

/// Request kinds that never carry metric tags in a rewritable form.
pub const IGNORED_QUERY_KEYS: [&str; 4] = ["log_query", "apm_query", "rum_query", "network_query"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Fill,
    Size,
}

impl Axis {
    pub fn parse(marker: &str) -> Option<Self> {
        match marker {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "fill" => Some(Self::Fill),
            "size" => Some(Self::Size),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Fill => "fill",
            Self::Size => "size",
        }
    }
}

/// Where an entry sits inside its `requests` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSlot {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for RequestSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "requests[{i}]"),
            Self::Key(k) => write!(f, "requests.{k}"),
        }
    }
}

/// One classified entry of a `requests` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// `{ "q": "<query>" }`
    Metric { index: usize },
    /// `requests.<axis>.q`
    NamedAxis { axis: Axis },
    /// `{ "process_query": { "filter_by": "<filter>" | ["<tag>", ..] } }`
    Process { index: usize },
    /// Log, APM, RUM and network queries are left untouched.
    Ignored { kind: &'static str },
    Unsupported { slot: RequestSlot, detail: String },
}

impl QueryNode {
    /// JSON pointer of the tag-bearing value, relative to the requests value.
    fn pointer(&self) -> Option<String> {
        match self {
            Self::Metric { index } => Some(format!("/{index}/q")),
            Self::NamedAxis { axis } => Some(format!("/{}/q", axis.as_str())),
            Self::Process { index } => Some(format!("/{index}/process_query/filter_by")),
            Self::Ignored { .. } | Self::Unsupported { .. } => None,
        }
    }
}

/// Slots of a requests collection in document order.
pub fn request_slots(requests: &Value) -> Vec<RequestSlot> {
    match requests {
        Value::Array(items) => (0..items.len()).map(RequestSlot::Index).collect(),
        Value::Object(map) => map.keys().cloned().map(RequestSlot::Key).collect(),
        _ => Vec::new(),
    }
}

/// Classifies one slot. Priority: axis marker, `process_query.filter_by`,
/// plain `q`, otherwise unsupported.
pub fn classify(requests: &Value, slot: &RequestSlot) -> QueryNode {
    let unsupported = |detail: &str| QueryNode::Unsupported {
        slot: slot.clone(),
        detail: detail.to_string(),
    };

    match slot {
        RequestSlot::Key(key) => {
            let Some(axis) = Axis::parse(key) else {
                return unsupported("unrecognized axis marker");
            };
            let node = &requests[key.as_str()];
            if let Some(kind) = ignored_kind(node) {
                return QueryNode::Ignored { kind };
            }
            if node.get("q").is_some_and(Value::is_string) {
                QueryNode::NamedAxis { axis }
            } else {
                unsupported("axis request without a `q` string")
            }
        }
        RequestSlot::Index(index) => {
            let node = &requests[*index];
            if !node.is_object() {
                return unsupported("request entry is not an object");
            }
            if let Some(kind) = ignored_kind(node) {
                return QueryNode::Ignored { kind };
            }
            if let Some(filter) = node.pointer("/process_query/filter_by") {
                return match TagPayload::from_value(filter) {
                    Some(_) => QueryNode::Process { index: *index },
                    None => unsupported(
                        "`process_query.filter_by` is neither a string nor a list of strings",
                    ),
                };
            }
            if node.get("q").is_some_and(Value::is_string) {
                QueryNode::Metric { index: *index }
            } else {
                unsupported("no `q`, `process_query.filter_by` or axis marker")
            }
        }
    }
}

fn ignored_kind(node: &Value) -> Option<&'static str> {
    IGNORED_QUERY_KEYS
        .iter()
        .copied()
        .find(|key| node.get(*key).is_some())
}

/// Reads the tag-bearing payload for `node`.
pub fn extract(requests: &Value, node: &QueryNode) -> Result<TagPayload> {
    let pointer = node.pointer().ok_or_else(|| shape_error(node))?;
    requests
        .pointer(&pointer)
        .and_then(TagPayload::from_value)
        .ok_or_else(|| RetagError::structural(format!("no query string at {pointer}")))
}

/// Writes `payload` back to the location [`extract`] read from.
pub fn write(requests: &mut Value, node: &QueryNode, payload: TagPayload) -> Result<()> {
    let pointer = node.pointer().ok_or_else(|| shape_error(node))?;
    let slot = requests
        .pointer_mut(&pointer)
        .ok_or_else(|| RetagError::structural(format!("no query string at {pointer}")))?;
    *slot = payload.into_value();
    Ok(())
}

fn shape_error(node: &QueryNode) -> RetagError {
    match node {
        QueryNode::Unsupported { slot, detail } => {
            RetagError::unsupported_query(format!("{slot}: {detail}"))
        }
        other => RetagError::unsupported_query(format!("{other:?} has no query location")),
    }
}

/// Rewrites every query node of a `requests` collection in place.
///
/// Returns whether any node changed. An unsupported node fails the whole
/// collection before anything after it is touched.
pub fn rewrite_requests(requests: &mut Value, mapping: &TagMapping) -> Result<bool> {
    let mut changed = false;
    for slot in request_slots(requests) {
        let node = classify(requests, &slot);
        match node {
            QueryNode::Ignored { kind } => {
                tracing::trace!(%slot, kind, "skipping ignored query");
                continue;
            }
            QueryNode::Unsupported { .. } => return Err(shape_error(&node)),
            QueryNode::Metric { .. } | QueryNode::NamedAxis { .. } | QueryNode::Process { .. } => {
                let outcome = substitute(&extract(requests, &node)?, mapping);
                if outcome.changed {
                    write(requests, &node, outcome.value)?;
                    changed = true;
                }
            }
        }
    }
    Ok(changed)
}

/// Rewrites a string or string-list field of `object` in place.
///
/// `None` means the field is absent, null, or not a string/string list.
pub fn rewrite_field(object: &mut Value, field: &str, mapping: &TagMapping) -> Option<bool> {
    let slot = object.get_mut(field)?;
    let payload = TagPayload::from_value(slot)?;
    let outcome = substitute(&payload, mapping);
    if outcome.changed {
        *slot = outcome.value.into_value();
    }
    Some(outcome.changed)
}
