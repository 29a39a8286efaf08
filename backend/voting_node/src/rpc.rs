//! Soroban RPC client: polls `getEvents` and decodes voting events.
//!
//! Events are requested with `xdrFormat: "json"`, so topics and values
//! arrive as ScVal JSON (`{"symbol":"created"}`, `{"u64":"3"}`,
//! `{"map":[{"key":…,"val":…}]}`, …). [`scval_to_json`] flattens that into
//! plain JSON before anything else looks at it.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{NodeError, Result};
use crate::events::{DecodedEvent, EventKind};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topic list as ScVal JSON
    #[serde(rename = "topicJson", alias = "topic")]
    pub topic: Vec<Value>,
    /// Event data as ScVal JSON
    #[serde(rename = "valueJson", alias = "value")]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // -32600 / -32601 / -32602 are hard failures; everything else we retry
                    if matches!(err.code, -32600 | -32601 | -32602) {
                        return Err(NodeError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    NodeError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a page of raw RPC events. Events from failed contract calls are
/// dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<DecodedEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(index, e)| decode_single(e, index, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, index: usize, contract_id: &str) -> Option<DecodedEvent> {
    let topics: Vec<Value> = raw.topic.iter().map(scval_to_json).collect();

    // Leading topic symbol determines the event type.
    let kind = EventKind::from_topic(topics.first()?.as_str()?);
    let voting_id = topics.get(1).and_then(as_i64);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let payload = scval_to_json(&raw.value);
    let (actor, detail) = decode_data(&payload, kind);

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}:{}:{index}",
                raw.tx_hash.as_deref().unwrap_or("-")
            )
        });

    Some(DecodedEvent {
        event_id,
        kind,
        voting_id,
        actor,
        detail,
        payload,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pick the columns worth filtering on out of a flattened payload.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::VotingCreated => (
            extract_field(value, &["owner"]),
            extract_field(value, &["question"]),
        ),
        EventKind::VoterRegistered => (extract_field(value, &["voter"]), None),
        EventKind::VoterVoted => (
            extract_field(value, &["voter"]),
            extract_field(value, &["candidate"]),
        ),
        EventKind::VotingClosed => (None, extract_field(value, &["winner"])),
        EventKind::Unknown => (None, None),
    }
}

pub fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Flatten ScVal JSON into plain JSON.
///
/// Also accepts the older `{"type":…,"value":…}` shape. Anything that is
/// not recognisable ScVal is returned unchanged.
pub fn scval_to_json(value: &Value) -> Value {
    match value {
        Value::String(s) if s == "void" => Value::Null,
        Value::Object(obj) if obj.len() == 1 => {
            let Some((tag, inner)) = obj.iter().next() else {
                return value.clone();
            };
            match tag.as_str() {
                "symbol" | "string" | "address" | "bytes" => inner.clone(),
                "bool" => inner.clone(),
                "u32" | "i32" | "u64" | "i64" | "u128" | "i128" | "timepoint" | "duration" => {
                    number(inner)
                }
                "vec" => match inner {
                    Value::Array(items) => Value::Array(items.iter().map(scval_to_json).collect()),
                    _ => Value::Array(Vec::new()),
                },
                "map" => match inner {
                    Value::Array(entries) => Value::Object(flatten_map(entries)),
                    _ => Value::Object(Map::new()),
                },
                _ => value.clone(),
            }
        }
        Value::Object(obj) if obj.contains_key("type") && obj.contains_key("value") => {
            match obj.get("type").and_then(Value::as_str) {
                Some("void") => Value::Null,
                Some("u32" | "i32" | "u64" | "i64" | "u128" | "i128") => {
                    number(&obj["value"])
                }
                _ => scval_to_json(&obj["value"]),
            }
        }
        _ => value.clone(),
    }
}

fn flatten_map(entries: &[Value]) -> Map<String, Value> {
    let mut out = Map::new();
    for entry in entries {
        let (Some(key), Some(val)) = (entry.get("key"), entry.get("val")) else {
            continue;
        };
        let key = match scval_to_json(key) {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.insert(key, scval_to_json(val));
    }
    out
}

/// Large integers arrive as decimal strings; keep them numeric when they fit.
fn number(raw: &Value) -> Value {
    match raw {
        Value::String(s) => s
            .parse::<u64>()
            .map(Value::from)
            .or_else(|_| s.parse::<i64>().map(Value::from))
            .unwrap_or_else(|_| raw.clone()),
        _ => raw.clone(),
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
