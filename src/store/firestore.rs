// src/store/firestore.rs
//! Firestore REST (v1) gateway.
//!
//! Collections: `videos` (keyed by item id), `logs` and `errors` (append-only,
//! random ids). Ingestion/log timestamps use the server `REQUEST_TIME`
//! transform, so ordering follows commit order rather than client clocks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::FirestoreSettings;
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::types::{ContentItem, ErrorLogEntry, ExecutionLogEntry, PersistenceGateway};

pub const VIDEOS: &str = "videos";
pub const LOGS: &str = "logs";
pub const ERRORS: &str = "errors";

/// Field holding the server-assigned ingestion time on `videos`.
const VIDEO_TS_FIELD: &str = "timestamp";

pub struct FirestoreGateway {
    http: reqwest::Client,
    /// `projects/{p}/databases/(default)/documents`
    documents_path: String,
    /// `{scheme}://{host}/v1/` + `documents_path`
    documents_url: String,
    token: Option<String>,
}

impl FirestoreGateway {
    pub fn new(settings: &FirestoreSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shorts-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building firestore http client")?;

        let documents_path = format!(
            "projects/{}/databases/(default)/documents",
            settings.project_id
        );
        let (root, token) = match &settings.emulator_host {
            // The emulator treats "owner" as an admin credential.
            Some(host) => (
                format!("http://{host}/v1"),
                settings.access_token.clone().or_else(|| Some("owner".into())),
            ),
            None => (
                "https://firestore.googleapis.com/v1".to_string(),
                settings.access_token.clone(),
            ),
        };
        Ok(Self {
            http,
            documents_url: format!("{root}/{documents_path}"),
            documents_path,
            token,
        })
    }

    async fn send(&self, op: &str, req: reqwest::RequestBuilder) -> IngestResult<reqwest::Response> {
        let req = match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        };
        req.send()
            .await
            .map_err(|e| IngestError::Store(format!("{op}: {e}")))
    }

    async fn ok_body(op: &str, resp: reqwest::Response) -> IngestResult<String> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| IngestError::Store(format!("{op} body: {e}")))?;
        if !status.is_success() {
            return Err(IngestError::Store(format!(
                "{op} returned {status} {}",
                error_message(&body)
            )));
        }
        Ok(body)
    }

    async fn commit(&self, op: &str, writes: Vec<Value>) -> IngestResult<()> {
        let url = format!("{}:commit", self.documents_url);
        let resp = self
            .send(op, self.http.post(url).json(&json!({ "writes": writes })))
            .await?;
        Self::ok_body(op, resp).await.map(|_| ())
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_path)
    }
}

#[async_trait]
impl PersistenceGateway for FirestoreGateway {
    async fn item_exists(&self, item_id: &str) -> IngestResult<bool> {
        let url = format!("{}/{VIDEOS}/{item_id}", self.documents_url);
        let req = self.http.get(url).query(&[("mask.fieldPaths", "videoId")]);
        let resp = self.send("get video", req).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ok_body("get video", resp).await.map(|_| true)
    }

    async fn count_ingested_since(&self, since: DateTime<Utc>) -> IngestResult<u64> {
        let url = format!("{}:runAggregationQuery", self.documents_url);
        let resp = self
            .send("count videos", self.http.post(url).json(&count_since_query(since)))
            .await?;
        let body = Self::ok_body("count videos", resp).await?;
        parse_count_response(&body)
    }

    async fn save_batch(&self, items: &[ContentItem]) -> IngestResult<()> {
        let writes = items
            .iter()
            .map(|it| {
                let fields = document_fields(it)?;
                Ok(server_stamped_write(
                    self.doc_name(VIDEOS, &it.item_id),
                    fields,
                    VIDEO_TS_FIELD,
                ))
            })
            .collect::<IngestResult<Vec<_>>>()?;
        // One commit keeps the batch all-or-nothing.
        self.commit("save batch", writes).await
    }

    async fn log_execution(&self, entry: &ExecutionLogEntry) -> IngestResult<()> {
        let mut fields = Map::new();
        fields.insert("videoCount".into(), to_value(&json!(entry.items_ingested)));
        fields.insert("quotaUsed".into(), to_value(&json!(entry.quota_units)));
        let write = server_stamped_write(self.doc_name(LOGS, &new_doc_id()), fields, "date");
        self.commit("log execution", vec![write]).await
    }

    async fn log_error(&self, entry: &ErrorLogEntry) -> IngestResult<()> {
        let mut fields = Map::new();
        fields.insert("message".into(), to_value(&json!(entry.message)));
        fields.insert("stack".into(), to_value(&json!(entry.detail)));
        let write = server_stamped_write(self.doc_name(ERRORS, &new_doc_id()), fields, "timestamp");
        self.commit("log error", vec![write]).await
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}

fn new_doc_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Full-document write (replaces any existing document) plus a server
/// timestamp on `ts_field`.
fn server_stamped_write(name: String, fields: Map<String, Value>, ts_field: &str) -> Value {
    json!({
        "update": { "name": name, "fields": fields },
        "updateTransforms": [
            { "fieldPath": ts_field, "setToServerValue": "REQUEST_TIME" }
        ]
    })
}

fn count_since_query(since: DateTime<Utc>) -> Value {
    json!({
        "structuredAggregationQuery": {
            "structuredQuery": {
                "from": [{ "collectionId": VIDEOS }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": VIDEO_TS_FIELD },
                        "op": "GREATER_THAN_OR_EQUAL",
                        "value": { "timestampValue": since.to_rfc3339_opts(SecondsFormat::Micros, true) }
                    }
                }
            },
            "aggregations": [{ "alias": "count", "count": {} }]
        }
    })
}

fn parse_count_response(body: &str) -> IngestResult<u64> {
    #[derive(Deserialize)]
    struct Row {
        result: Option<AggResult>,
    }
    #[derive(Deserialize)]
    struct AggResult {
        #[serde(rename = "aggregateFields", default)]
        aggregate_fields: HashMap<String, Value>,
    }

    let rows: Vec<Row> = serde_json::from_str(body)
        .map_err(|e| IngestError::MalformedData(format!("aggregation response: {e}")))?;
    let field = rows
        .into_iter()
        .find_map(|r| r.result)
        .and_then(|r| r.aggregate_fields.get("count").cloned())
        .ok_or_else(|| IngestError::MalformedData("aggregation response without count".into()))?;

    // integerValue is encoded as a decimal string.
    field
        .get("integerValue")
        .and_then(|v| match v {
            Value::String(s) => s.parse::<u64>().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .ok_or_else(|| IngestError::MalformedData(format!("unexpected count value {field}")))
}

/// Encode an item as Firestore fields, reusing its serde field names.
fn document_fields(item: &ContentItem) -> IngestResult<Map<String, Value>> {
    match serde_json::to_value(item) {
        Ok(Value::Object(obj)) => Ok(obj.iter().map(|(k, v)| (k.clone(), to_value(v))).collect()),
        Ok(other) => Err(IngestError::MalformedData(format!("item encodes as {other}"))),
        Err(e) => Err(IngestError::MalformedData(format!("encoding item: {e}"))),
    }
}

/// Plain JSON -> Firestore typed `Value`.
fn to_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(a) => json!({ "arrayValue": { "values": a.iter().map(to_value).collect::<Vec<_>>() } }),
        Value::Object(o) => {
            let fields: Map<String, Value> = o.iter().map(|(k, v)| (k.clone(), to_value(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: ApiError,
    }
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }
    serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> ContentItem {
        ContentItem {
            item_id: "abc123".into(),
            title: "Title".into(),
            description: "Desc".into(),
            thumbnail_url: "https://i.ytimg.com/vi/abc123/hqdefault.jpg".into(),
            duration: "PT45S".into(),
            duration_seconds: 45,
            channel_id: "UC1".into(),
            creator_username: "Creator".into(),
            creator_avatar: "https://yt3.ggpht.com/a.jpg".into(),
            is_verified: true,
            likes: 10,
            comments: 2,
            is_ai: true,
            ingested_at: None,
        }
    }

    #[test]
    fn item_fields_use_document_names() {
        let f = document_fields(&item()).unwrap();
        assert_eq!(f["videoId"], json!({ "stringValue": "abc123" }));
        assert_eq!(f["thumbnail"]["stringValue"], "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
        assert_eq!(f["durationSeconds"], json!({ "integerValue": "45" }));
        assert_eq!(f["isVerified"], json!({ "booleanValue": true }));
        assert_eq!(f["isAI"], json!({ "booleanValue": true }));
        assert_eq!(f["creatorUsername"]["stringValue"], "Creator");
        // server-assigned, never written by the client
        assert!(!f.contains_key("timestamp"));
    }

    #[test]
    fn write_carries_server_timestamp_transform() {
        let w = server_stamped_write("projects/p/databases/(default)/documents/videos/x".into(), Map::new(), "timestamp");
        assert_eq!(w["update"]["name"], "projects/p/databases/(default)/documents/videos/x");
        assert_eq!(w["updateTransforms"][0]["fieldPath"], "timestamp");
        assert_eq!(w["updateTransforms"][0]["setToServerValue"], "REQUEST_TIME");
    }

    #[test]
    fn count_query_filters_on_timestamp() {
        let since = Utc.with_ymd_and_hms(2024, 5, 10, 23, 0, 0).unwrap();
        let q = count_since_query(since);
        let filter = &q["structuredAggregationQuery"]["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "timestamp");
        assert_eq!(filter["op"], "GREATER_THAN_OR_EQUAL");
        assert_eq!(filter["value"]["timestampValue"], "2024-05-10T23:00:00.000000Z");
    }

    #[test]
    fn count_response_is_parsed() {
        let body = r#"[{"result":{"aggregateFields":{"count":{"integerValue":"17"}}},"readTime":"2024-05-10T23:00:01Z"}]"#;
        assert_eq!(parse_count_response(body).unwrap(), 17);
    }

    #[test]
    fn count_response_without_result_is_malformed() {
        let body = r#"[{"readTime":"2024-05-10T23:00:01Z"}]"#;
        assert!(matches!(parse_count_response(body), Err(IngestError::MalformedData(_))));
    }

    #[test]
    fn emulator_settings_target_plain_http() {
        let gw = FirestoreGateway::new(&FirestoreSettings {
            project_id: "demo".into(),
            access_token: None,
            emulator_host: Some("localhost:8080".into()),
        })
        .unwrap();
        assert_eq!(
            gw.documents_url,
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents"
        );
        assert_eq!(gw.token.as_deref(), Some("owner"));
        assert_eq!(gw.doc_name(VIDEOS, "v1"), "projects/demo/databases/(default)/documents/videos/v1");
    }
}
