use serde_json::Value;

use super::ResourceWalker;
use crate::errors::{Result, RetagError};
use crate::mapping::TagMapping;
use crate::query::{rewrite_field, rewrite_requests};
use crate::substitute::TagPayload;

/// Widget kinds whose definitions carry no rewritable metric query.
pub const UNSUPPORTED_WIDGET_TYPES: [&str; 8] = [
    "alert_value",
    "check_status",
    "alert_graph",
    "slo",
    "image",
    "trace_service",
    "free_text",
    "iframe",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardWalker;

impl ResourceWalker for DashboardWalker {
    fn walk(&self, config: &mut Value, mapping: &TagMapping) -> Result<bool> {
        let widgets = config
            .get_mut("widgets")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| RetagError::structural("dashboard has no `widgets` array"))?;

        let mut changed = false;
        for (index, widget) in widgets.iter_mut().enumerate() {
            changed |= walk_widget(widget, mapping, Depth::Top)
                .map_err(|e| e.at(format_args!("widgets[{index}]")))?;
        }
        Ok(changed)
    }
}

/// Group widgets are expanded once; a group nested inside a group is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    Top,
    Grouped,
}

/// What a widget definition looks like, checked in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetShape {
    Requests,
    Group,
    Query,
    Filters,
    Unsupported(&'static str),
    Unrecognized,
}

impl WidgetShape {
    fn of(definition: &Value, depth: Depth) -> Self {
        if definition.get("requests").is_some_and(is_populated) {
            return Self::Requests;
        }
        if depth == Depth::Top && definition.get("widgets").is_some_and(is_populated) {
            return Self::Group;
        }
        if definition.get("query").is_some_and(is_tag_text) {
            return Self::Query;
        }
        if definition.get("filters").is_some_and(is_tag_text) {
            return Self::Filters;
        }
        let kind = definition.get("type").and_then(Value::as_str);
        match UNSUPPORTED_WIDGET_TYPES.iter().copied().find(|t| Some(*t) == kind) {
            Some(kind) => Self::Unsupported(kind),
            None => Self::Unrecognized,
        }
    }
}

fn walk_widget(widget: &mut Value, mapping: &TagMapping, depth: Depth) -> Result<bool> {
    let definition = widget
        .get_mut("definition")
        .filter(|d| d.is_object())
        .ok_or_else(|| RetagError::structural("widget has no `definition` object"))?;

    match WidgetShape::of(definition, depth) {
        WidgetShape::Requests => rewrite_requests(&mut definition["requests"], mapping)
            .map_err(|e| e.at("definition")),
        WidgetShape::Group => {
            let mut changed = false;
            if let Some(children) = definition["widgets"].as_array_mut() {
                for (index, child) in children.iter_mut().enumerate() {
                    changed |= walk_widget(child, mapping, Depth::Grouped)
                        .map_err(|e| e.at(format_args!("definition.widgets[{index}]")))?;
                }
            }
            Ok(changed)
        }
        WidgetShape::Query => Ok(rewrite_field(definition, "query", mapping).unwrap_or(false)),
        WidgetShape::Filters => Ok(rewrite_field(definition, "filters", mapping).unwrap_or(false)),
        WidgetShape::Unsupported(kind) => {
            tracing::debug!(kind, "skipping unsupported widget");
            Ok(false)
        }
        WidgetShape::Unrecognized => {
            let kind = definition
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<none>");
            tracing::debug!(kind, "skipping unrecognized widget");
            Ok(false)
        }
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn is_tag_text(value: &Value) -> bool {
    match TagPayload::from_value(value) {
        Some(TagPayload::Text(s)) => !s.is_empty(),
        Some(TagPayload::List(items)) => !items.is_empty(),
        None => false,
    }
}
