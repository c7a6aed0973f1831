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

// Feed an asm-update through a session and print the rendered listing.
//
//   cargo run --example print_rows -- instructions.json listing.json

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use asm_view::backend::FileBackend;
use asm_view::error::HubError;
use asm_view::event_hub::ASM_UPDATE;
use asm_view::hover::HoverDetail;
use asm_view::storage::MemoryStorage;
use asm_view::{ActiveView, Event, EventHub, Session, UiNotifier, Upstream};

struct Local;

impl Upstream for Local {
    fn open(&self, _event: &str) -> Result<(), HubError> {
        Ok(())
    }
}

impl UiNotifier for Local {
    fn switch_view(&self, view: ActiveView) -> Result<()> {
        eprintln!("view -> {:?}", view);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <instructions.json> <listing.json>", args[0]);
        std::process::exit(2);
    }

    let session = Session::new(
        Arc::new(EventHub::new(Local)),
        Arc::new(MemoryStorage::new()),
        FileBackend::new(&args[1], None),
        Arc::new(Local),
        HoverDetail::default(),
    )?;

    let listing = std::fs::read(&args[2]).with_context(|| format!("reading {}", args[2]))?;
    let payload = serde_json::from_slice(&listing)?;
    session.hub.dispatch(&Event::new(ASM_UPDATE, payload));

    for row in session.rows().await? {
        println!("{}", row.format_line());
    }
    Ok(())
}
