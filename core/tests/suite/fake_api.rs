//! In-memory [`ResourceApi`] with canned GET responses and a PUT log.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use retag_core::{ResourceApi, Result, RetagError, TagMapping};
use serde_json::Value;
use serde_json::json;

#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, Value>,
    gets: Mutex<Vec<String>>,
    puts: Mutex<Vec<(String, Value)>>,
}

impl FakeApi {
    pub fn with(mut self, path: &str, body: Value) -> Self {
        self.responses.insert(path.to_string(), body);
        self
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_paths(&self) -> Vec<String> {
        self.puts().into_iter().map(|(path, _)| path).collect()
    }
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.gets.lock().unwrap().push(path.to_string());
        self.responses
            .get(path)
            .cloned()
            .ok_or_else(|| RetagError::Http {
                method: "GET",
                path: path.to_string(),
                status: 404,
                body: r#"{"errors":["Not found"]}"#.to_string(),
            })
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.puts
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        Ok(body.clone())
    }
}

pub fn mapping() -> TagMapping {
    TagMapping::new([("env:staging", "env:production"), ("team:core", "team:platform")]).unwrap()
}

pub fn dashboard(id: &str, query: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Dashboard {id}"),
        "layout_type": "ordered",
        "author_handle": "ops@example.com",
        "author_name": "Ops",
        "url": format!("/dashboard/{id}/checkout"),
        "created_at": "2024-01-10T09:00:00.000000+00:00",
        "modified_at": "2024-02-01T12:30:00.000000+00:00",
        "widgets": [
            {"id": 100, "definition": {"type": "timeseries", "requests": [{"q": query}]}},
            {"id": 101, "definition": {"type": "note", "content": "env:staging lives here"}}
        ]
    })
}

/// One resource that changes and one that does not, per family.
pub fn fleet() -> FakeApi {
    FakeApi::default()
        .with(
            "dashboard",
            json!({"dashboards": [{"id": "d1", "title": "Checkout"}, {"id": "d2", "title": "Infra"}]}),
        )
        .with(
            "dashboard/d1",
            dashboard("d1", "avg:system.cpu.user{env:staging,team:core}"),
        )
        .with("dashboard/d2", dashboard("d2", "avg:system.cpu.user{env:prod}"))
        .with(
            "monitor",
            json!([
                {
                    "id": 1,
                    "name": "CPU high",
                    "query": "avg(last_5m):avg:system.cpu.user{env:staging} > 90",
                    "tags": ["team:core"],
                    "overall_state": "OK",
                    "overall_state_modified": "2024-03-01T00:00:00+00:00",
                    "creator": {"handle": "ops@example.com"},
                    "org_id": 7,
                    "multi": false,
                    "deleted": null,
                    "matching_downtimes": []
                },
                {
                    "id": 2,
                    "name": "Disk",
                    "query": "avg(last_5m):avg:system.disk.used{env:prod} > 90",
                    "tags": []
                }
            ]),
        )
        .with(
            "synthetics/tests",
            json!({"tests": [
                {"public_id": "s1", "type": "browser", "name": "Login"},
                {"public_id": "s2", "type": "api", "name": "Health"}
            ]}),
        )
        .with(
            "synthetics/tests/browser/s1",
            json!({
                "public_id": "s1",
                "monitor_id": 77,
                "name": "Login",
                "type": "browser",
                "tags": ["env:staging", "team:web"]
            }),
        )
        .with(
            "synthetics/tests/api/s2",
            json!({
                "public_id": "s2",
                "monitor_id": 78,
                "name": "Health",
                "type": "api",
                "tags": ["env:production"]
            }),
        )
}
