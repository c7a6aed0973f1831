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

//! Entry point for the `serve` subcommand: the stdio helper the UI process talks to.
//! Framed JSON comes in on stdin (events and requests), responses and notifications go
//! out on stdout, logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::backend::FileBackend;
use crate::event_hub::EventHub;
use crate::hover::HoverDetail;
use crate::protocol::{
    switch_view_notification, ListenUpstream, Outbound, OutboundNotifier, StdoutOutbound,
};
use crate::request_handler::dispatch_message;
use crate::session::Session;
use crate::storage::Storage;
use crate::transport::StdioReader;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// JSON file with the backend's instruction table (`get_instruction_list`)
    #[arg(short = 'i', long = "instructions")]
    pub instructions: PathBuf,

    /// JSON file with the backend's device list (`get_mcu_list`)
    #[arg(long = "devices")]
    pub devices: Option<PathBuf>,

    /// Milliseconds the pointer must rest on a row before its detail is shown
    #[arg(long = "hover-delay-ms", default_value_t = 3000)]
    pub hover_delay_ms: u64,
}

pub async fn run(args: ServeArgs, storage: Arc<dyn Storage>) -> Result<()> {
    let out: Arc<dyn Outbound> = Arc::new(StdoutOutbound);
    let hub = Arc::new(EventHub::new(ListenUpstream::new(out.clone())));
    let backend = FileBackend::new(args.instructions, args.devices);
    let session = Arc::new(Session::new(
        hub,
        storage,
        backend,
        Arc::new(OutboundNotifier::new(out.clone())),
        HoverDetail::new(Duration::from_millis(args.hover_delay_ms)),
    )?);

    // An update right before a reload left a marker; send the UI back to that panel once.
    if let Some(view) = session.snapshots.take_active_view()? {
        out.send(&switch_view_notification(view))?;
    }

    // stdin is blocking, so it gets its own thread feeding the async loop.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Value>();
    std::thread::spawn(move || {
        let mut reader = StdioReader::stdin();
        loop {
            match reader.read_message() {
                Ok(Some(msg)) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read message: {:#}", e);
                    break;
                }
            }
        }
    });

    log::info!("asm-view helper ready");
    // One message at a time: events apply in arrival order.
    while let Some(msg) = rx.recv().await {
        if !dispatch_message(&msg, &session, &out).await {
            log::debug!("message not handled: {}", msg);
        }
    }
    log::info!("input closed, shutting down");
    Ok(())
}
