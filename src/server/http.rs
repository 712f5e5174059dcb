// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! HTTP gateway: CCIP-Read endpoints plus the record management API

use crate::codec::Node;
use crate::crypto::{sign_response, GatewaySigner};
use crate::error::GatewayError;
use crate::record::builder::register_entity;
use crate::record::mutation::set_field_update;
use crate::record::query::{count_matching, EntityQuery};
use crate::record::store::{MemoryStore, RecordStore};
use crate::resolve::resolve_call;
use crate::server::audit::AuditLog;
use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Shared gateway state. The store only sees one request at a time
/// through the mutex, so record mutation is atomic per request.
pub struct AppState {
    pub store: Mutex<MemoryStore>,
    pub signer: GatewaySigner,
    pub audit: AuditLog,
    pub ttl_secs: u64,
    pub started: SystemTime,
}

fn json_response(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    let payload = body.to_string();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", "*")
        .body(Full::new(Bytes::from(payload)))
        .unwrap()
}

fn error_response(err: &GatewayError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, json!({ "error": err.to_string() }))
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = &raw[i + 1..i + 3];
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for pair in query.split('&') {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            let value = parts.next().unwrap_or_default();
            params.insert(percent_decode(key), percent_decode(value));
        }
    }
    params
}

fn parse_sender(raw: &str) -> Option<[u8; 20]> {
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw).ok()?.try_into().ok()
}

fn decode_hex_calldata(raw: &str) -> Option<Vec<u8>> {
    hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).ok()
}

async fn read_json_body(req: Request<Incoming>) -> Result<Value, GatewayError> {
    let body = req
        .collect()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("failed to read body: {}", e)))?
        .to_bytes();
    serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("invalid JSON body: {}", e)))
}

/// Run the CCIP-Read pipeline for one request: decode, dispatch, sign.
/// Decode failures return an empty-bytes payload with a client error;
/// everything the dispatcher answers (including empty) gets signed.
async fn handle_ccip(state: &AppState, sender_raw: &str, calldata_raw: &str) -> Response<Full<Bytes>> {
    let Some(sender) = parse_sender(sender_raw) else {
        return json_response(StatusCode::BAD_REQUEST, json!({ "data": "0x" }));
    };
    let Some(calldata) = decode_hex_calldata(calldata_raw) else {
        return json_response(StatusCode::BAD_REQUEST, json!({ "data": "0x" }));
    };

    let outcome = {
        let store = state.store.lock().await;
        resolve_call(&*store, &calldata)
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("CCIP decode failure: {}", e);
            return json_response(StatusCode::BAD_REQUEST, json!({ "data": "0x" }));
        }
    };

    let envelope = match sign_response(
        &state.signer,
        &sender,
        &calldata,
        &outcome.result,
        state.ttl_secs,
    ) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(name = %outcome.name, node = %outcome.node, "signing failed: {}", e);
            return error_response(&e);
        }
    };

    state.audit.append(
        "CCIP-Read resolved",
        json!({
            "sender": sender_raw,
            "name": outcome.name,
            "node": outcome.node.to_hex(),
            "resultLen": outcome.result.len(),
        }),
    );

    json_response(
        StatusCode::OK,
        json!({ "data": format!("0x{}", hex::encode(envelope)) }),
    )
}

async fn handle_register(state: &AppState, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let body = match read_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let Some(request) = body.as_object() else {
        return error_response(&GatewayError::BadRequest(
            "expected a JSON object".to_string(),
        ));
    };
    let Some(name) = request.get("name").and_then(Value::as_str) else {
        return error_response(&GatewayError::BadRequest(
            "name is required (e.g. alice.test.divicompany.eth)".to_string(),
        ));
    };

    let mut store = state.store.lock().await;
    let (node, record) = match register_entity(&mut *store, name, request) {
        Ok(built) => built,
        Err(e) => {
            if matches!(e, GatewayError::Conflict(_)) {
                tracing::warn!(name, "duplicate registration rejected");
            }
            return error_response(&e);
        }
    };
    drop(store);

    state.audit.append(
        "Subdomain registered",
        json!({
            "name": name,
            "entityid": record.entityid,
            "node": node.to_hex(),
            "registrar": record.registrar,
        }),
    );

    json_response(
        StatusCode::OK,
        json!({
            "success": true,
            "name": name,
            "node": node.to_hex(),
            "record": record,
        }),
    )
}

async fn handle_set_text(state: &AppState, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let body = match read_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let Some(node_raw) = body.get("node").and_then(Value::as_str) else {
        return error_response(&GatewayError::BadRequest("node is required".to_string()));
    };
    let Some(key) = body.get("key").and_then(Value::as_str) else {
        return error_response(&GatewayError::BadRequest("key is required".to_string()));
    };
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    let node: Node = match node_raw.parse() {
        Ok(node) => node,
        Err(_) => {
            return error_response(&GatewayError::BadRequest(format!(
                "invalid node: {}",
                node_raw
            )))
        }
    };

    let mut store = state.store.lock().await;
    let record = match set_field_update(&mut *store, &node, key, &value) {
        Ok(record) => record,
        Err(e) => return error_response(&e),
    };
    drop(store);

    state.audit.append(
        "Record updated",
        json!({ "node": node.to_hex(), "key": key }),
    );

    json_response(
        StatusCode::OK,
        json!({
            "success": true,
            "node": node.to_hex(),
            "record": record,
        }),
    )
}

async fn handle_subdomains(state: &AppState) -> Response<Full<Bytes>> {
    let store = state.store.lock().await;
    let entries: Vec<Value> = store
        .list()
        .iter()
        .map(|(node, record)| record.to_json_with_node(node))
        .collect();

    json_response(
        StatusCode::OK,
        json!({ "count": entries.len(), "subdomains": entries }),
    )
}

async fn handle_entities_list(
    state: &AppState,
    params: HashMap<String, String>,
) -> Response<Full<Bytes>> {
    let query = EntityQuery::from_params(&params);
    let store = state.store.lock().await;
    let records = store.list();
    drop(store);

    let total = count_matching(&query, &records);
    let entities: Vec<Value> = query
        .run(records)
        .iter()
        .map(|(node, record)| record.to_json_with_node(node))
        .collect();

    json_response(
        StatusCode::OK,
        json!({
            "total": total,
            "page": query.page,
            "limit": query.limit,
            "count": entities.len(),
            "entities": entities,
        }),
    )
}

async fn handle_get_record(
    state: &AppState,
    params: HashMap<String, String>,
) -> Response<Full<Bytes>> {
    let Some(node_raw) = params.get("nodehash") else {
        return error_response(&GatewayError::BadRequest(
            "nodehash query parameter is required".to_string(),
        ));
    };
    let node: Node = match node_raw.parse() {
        Ok(node) => node,
        Err(_) => {
            return error_response(&GatewayError::BadRequest(format!(
                "invalid nodehash: {}",
                node_raw
            )))
        }
    };

    let store = state.store.lock().await;
    match store.get(&node) {
        Some(record) => json_response(StatusCode::OK, record.to_json_with_node(&node)),
        None => error_response(&GatewayError::NotFound(format!(
            "no record for node {}",
            node
        ))),
    }
}

async fn handle_health(state: &AppState) -> Response<Full<Bytes>> {
    let count = state.store.lock().await.len();
    let uptime = state.started.elapsed().unwrap_or_default().as_secs();

    json_response(
        StatusCode::OK,
        json!({
            "status": "ok",
            "signer": state.signer.address(),
            "subdomainCount": count,
            "uptime": uptime,
        }),
    )
}

/// Route one request
async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let params = parse_query(req.uri().query());

    tracing::debug!(%method, %path, "request");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match segments.as_slice() {
        ["health"] if method == Method::GET => handle_health(&state).await,
        ["subdomains"] if method == Method::GET => handle_subdomains(&state).await,
        ["direct", "getEntitiesList"] if method == Method::GET => {
            handle_entities_list(&state, params).await
        }
        ["direct", "getRecord"] if method == Method::GET => {
            handle_get_record(&state, params).await
        }
        ["register"] if method == Method::POST => handle_register(&state, req).await,
        ["setText"] if method == Method::POST => handle_set_text(&state, req).await,
        ["rpc"] if method == Method::POST => {
            let body = match read_json_body(req).await {
                Ok(body) => body,
                Err(e) => return Ok(error_response(&e)),
            };
            let sender = body.get("sender").and_then(Value::as_str).unwrap_or("");
            let data = body.get("data").and_then(Value::as_str).unwrap_or("");
            if sender.is_empty() || data.is_empty() {
                error_response(&GatewayError::BadRequest(
                    "sender and data are required".to_string(),
                ))
            } else {
                handle_ccip(&state, sender, data).await
            }
        }
        // CCIP-Read GET variant: /:sender/:callData.json
        [sender, calldata] if method == Method::GET && calldata.ends_with(".json") => {
            let calldata = calldata.trim_end_matches(".json");
            handle_ccip(&state, sender, calldata).await
        }
        _ => json_response(StatusCode::NOT_FOUND, json!({ "error": "not found" })),
    };

    Ok(response)
}

/// Start the gateway HTTP server on the specified port
pub async fn run(port: u16, state: Arc<AppState>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .context("Failed to bind gateway socket")?;

    tracing::info!("Gateway listening on http://{}", addr);
    state.audit.append(
        "Gateway started",
        json!({ "port": port, "signer": state.signer.address() }),
    );

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                handle_request(state, req)
            });

            let io = TokioIo::new(stream);

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Connection error from {}: {}", remote_addr, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let params = parse_query(Some("registrar=test%2Ctest2&page=1&nameSubstring=acme+corp"));
        assert_eq!(params.get("registrar").unwrap(), "test,test2");
        assert_eq!(params.get("page").unwrap(), "1");
        assert_eq!(params.get("nameSubstring").unwrap(), "acme corp");
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_parse_sender() {
        assert!(parse_sender("0x1234567890123456789012345678901234567890").is_some());
        assert!(parse_sender("1234567890123456789012345678901234567890").is_some());
        assert!(parse_sender("0x1234").is_none());
        assert!(parse_sender("not hex").is_none());
    }

    #[test]
    fn test_decode_hex_calldata() {
        assert_eq!(decode_hex_calldata("0x9061b923").unwrap(), vec![0x90, 0x61, 0xb9, 0x23]);
        assert!(decode_hex_calldata("0xzz").is_none());
    }
}
