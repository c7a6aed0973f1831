// Copyright (c) 2026 MCU-Debug Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Protocol message types and helpers for the helper ↔ UI communication.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::HubError;
use crate::event_hub::Upstream;
use crate::model::RawInstruction;
use crate::row::SerRow;
use crate::session::UiNotifier;
use crate::snapshot::ActiveView;
use crate::transport;

/// Pushed event, e.g. `{"event": "asm-update", "payload": [...]}`.
#[derive(Deserialize, Debug)]
pub struct EventMessage {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Deserialize, Debug)]
pub struct RowsRequest {
    pub req: String, // "rows"
    pub seq: u64,
}

#[derive(Serialize, Debug)]
pub struct RowsResponse {
    pub req: String,
    pub seq: u64,
    pub rows: Vec<SerRow>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest {
    pub req: String, // "detail"
    pub seq: u64,
    pub opcode_id: u32,
}

#[derive(Serialize, Debug)]
pub struct DetailResponse {
    pub req: String,
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RawInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct HoverRequest {
    pub req: String, // "hover"
    pub seq: u64,
    pub address: u32,
}

/// Generic reply for requests that only succeed or fail ("clear", failed "rows").
#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub req: String,
    pub seq: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Where outbound messages go. The helper writes framed JSON to stdout.
pub trait Outbound: Send + Sync {
    fn send(&self, msg: &Value) -> anyhow::Result<()>;
}

pub struct StdoutOutbound;

impl Outbound for StdoutOutbound {
    fn send(&self, msg: &Value) -> anyhow::Result<()> {
        transport::write_json_locked(msg)
    }
}

/// Wrap a notification in a JSON-RPC envelope for sending to the UI.
pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    })
}

pub fn listen_notification(event: &str) -> Value {
    notification("listen", json!({ "event": event }))
}

pub fn switch_view_notification(view: ActiveView) -> Value {
    notification("switchView", json!({ "view": view }))
}

pub fn hover_detail_notification(address: u32, instruction: &RawInstruction) -> Value {
    notification(
        "hoverDetail",
        json!({ "address": address, "instruction": instruction }),
    )
}

/// Opens hub channels by asking the UI process to forward the event.
pub struct ListenUpstream {
    out: Arc<dyn Outbound>,
}

impl ListenUpstream {
    pub fn new(out: Arc<dyn Outbound>) -> Self {
        Self { out }
    }
}

impl Upstream for ListenUpstream {
    fn open(&self, event: &str) -> Result<(), HubError> {
        self.out
            .send(&listen_notification(event))
            .map_err(|e| HubError::Upstream {
                event: event.to_string(),
                reason: e.to_string(),
            })
    }
}

pub struct OutboundNotifier {
    out: Arc<dyn Outbound>,
}

impl OutboundNotifier {
    pub fn new(out: Arc<dyn Outbound>) -> Self {
        Self { out }
    }
}

impl UiNotifier for OutboundNotifier {
    fn switch_view(&self, view: ActiveView) -> anyhow::Result<()> {
        self.out.send(&switch_view_notification(view))
    }
}
