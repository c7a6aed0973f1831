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

/// Message parsing and dispatch for the helper's main loop.
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::event_hub::Event;
use crate::protocol::*;
use crate::row::SerRow;
use crate::session::Session;

/// Handle one inbound message. Messages with an `event` field are pushed into the hub;
/// messages with a `req` field are requests and get a response on `out`.
///
/// Returns false if the message could not be handled.
pub async fn dispatch_message<B: Backend + 'static>(
    msg: &Value,
    session: &Arc<Session<B>>,
    out: &Arc<dyn Outbound>,
) -> bool {
    if msg.get("event").is_some() {
        return handle_event(msg, session);
    }

    // Peek at the 'req' discriminant to determine request type
    let req_type = msg.get("req").and_then(|v| v.as_str());
    match req_type {
        Some("rows") => handle_rows_request(msg, session, out).await,
        Some("detail") => handle_detail_request(msg, session, out).await,
        Some("clear") => handle_clear_request(msg, session, out),
        Some("hover") => handle_hover_request(msg, session, out),
        Some("hoverLeave") => {
            session.hover.leave();
            true
        }
        _ => {
            log::warn!("Unknown request type: {:?}", req_type);
            false
        }
    }
}

fn handle_event<B: Backend + 'static>(msg: &Value, session: &Session<B>) -> bool {
    match serde_json::from_value::<EventMessage>(msg.clone()) {
        Ok(m) => {
            let delivered = session.hub.dispatch(&Event::new(m.event, m.payload));
            delivered > 0
        }
        Err(e) => {
            log::error!("Failed to parse event message: {}", e);
            false
        }
    }
}

async fn handle_rows_request<B: Backend + 'static>(
    msg: &Value,
    session: &Session<B>,
    out: &Arc<dyn Outbound>,
) -> bool {
    let typed_req = match serde_json::from_value::<RowsRequest>(msg.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to parse RowsRequest: {}", e);
            return false;
        }
    };
    match session.rows().await {
        Ok(rows) => {
            let response = RowsResponse {
                req: typed_req.req,
                seq: typed_req.seq,
                rows: rows.into_iter().map(SerRow::from).collect(),
            };
            send(out, &response)
        }
        Err(e) => {
            log::error!("Failed to render rows: {}", e);
            let response = StatusResponse {
                req: typed_req.req,
                seq: typed_req.seq,
                ok: false,
                error: Some(e.to_string()),
            };
            send(out, &response)
        }
    }
}

async fn handle_detail_request<B: Backend + 'static>(
    msg: &Value,
    session: &Session<B>,
    out: &Arc<dyn Outbound>,
) -> bool {
    let typed_req = match serde_json::from_value::<DetailRequest>(msg.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to parse DetailRequest: {}", e);
            return false;
        }
    };
    let (detail, error) = match session.detail(typed_req.opcode_id).await {
        Ok(raw) => (Some(raw), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let response = DetailResponse {
        req: typed_req.req,
        seq: typed_req.seq,
        detail,
        error,
    };
    send(out, &response)
}

fn handle_clear_request<B: Backend + 'static>(
    msg: &Value,
    session: &Session<B>,
    out: &Arc<dyn Outbound>,
) -> bool {
    let seq = msg.get("seq").and_then(|v| v.as_u64()).unwrap_or(0);
    let error = session.snapshots.clear().err().map(|e| e.to_string());
    let response = StatusResponse {
        req: "clear".to_string(),
        seq,
        ok: error.is_none(),
        error,
    };
    send(out, &response)
}

/// Start the delayed detail popup for the row at `address`. The detail arrives later as a
/// `hoverDetail` notification, unless the pointer leaves first.
fn handle_hover_request<B: Backend + 'static>(
    msg: &Value,
    session: &Arc<Session<B>>,
    out: &Arc<dyn Outbound>,
) -> bool {
    let typed_req = match serde_json::from_value::<HoverRequest>(msg.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to parse HoverRequest: {}", e);
            return false;
        }
    };
    let Some(instr) = session.snapshots.find(typed_req.address) else {
        log::debug!("hover on unknown address 0x{:x}", typed_req.address);
        return false;
    };

    let ticket = session.hover.enter(typed_req.address);
    let session = session.clone();
    let out = out.clone();
    tokio::spawn(async move {
        match session
            .hover
            .show_after_delay(ticket, instr.opcode_id, &session.metadata)
            .await
        {
            Ok(true) => {
                if let Some(detail) = session.hover.visible() {
                    let msg = hover_detail_notification(detail.address, &detail.instruction);
                    if let Err(e) = out.send(&msg) {
                        log::error!("Failed to write hover detail: {}", e);
                    }
                }
            }
            Ok(false) => {}
            Err(e) => log::warn!("hover detail for 0x{:x} failed: {}", ticket.address(), e),
        }
    });
    true
}

fn send<T: Serialize>(out: &Arc<dyn Outbound>, response: &T) -> bool {
    let value = match serde_json::to_value(response) {
        Ok(v) => v,
        Err(e) => {
            log::error!("Failed to serialize response: {}", e);
            return false;
        }
    };
    if let Err(e) = out.send(&value) {
        log::error!("Failed to write response: {}", e);
        return false;
    }
    true
}
