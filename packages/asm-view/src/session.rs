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

//! Wires hub events to the snapshot store and the instruction table.

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::error::{HubError, MetadataError};
use crate::event_hub::{
    Event, EventHub, ASM_UPDATE, CLOSE_REQUESTED, PROJECT_UPDATE, TAURI_CLOSE_REQUESTED,
};
use crate::hover::HoverDetail;
use crate::metadata::MetadataCache;
use crate::model::{Instruction, RawInstruction};
use crate::row::{render_row, RenderedRow};
use crate::snapshot::{ActiveView, SnapshotStore};
use crate::storage::Storage;

/// Receives the "go to this panel" signal after an update.
pub trait UiNotifier: Send + Sync {
    fn switch_view(&self, view: ActiveView) -> anyhow::Result<()>;
}

#[derive(Deserialize, Debug, Default)]
struct ProjectUpdate {
    #[serde(default)]
    mcu: String,
}

pub struct Session<B> {
    pub hub: Arc<EventHub>,
    pub snapshots: Arc<SnapshotStore>,
    pub metadata: Arc<MetadataCache<B>>,
    pub hover: HoverDetail,
}

impl<B: Backend + 'static> Session<B> {
    pub fn new(
        hub: Arc<EventHub>,
        storage: Arc<dyn Storage>,
        backend: B,
        notifier: Arc<dyn UiNotifier>,
        hover: HoverDetail,
    ) -> Result<Self, HubError> {
        let snapshots = Arc::new(SnapshotStore::open(storage.clone()));
        let metadata = Arc::new(MetadataCache::new(backend, storage));

        let store = snapshots.clone();
        hub.subscribe(ASM_UPDATE, move |event| {
            apply_asm_update(&store, notifier.as_ref(), event)
        })?;

        for close_event in [CLOSE_REQUESTED, TAURI_CLOSE_REQUESTED] {
            let store = snapshots.clone();
            hub.subscribe(close_event, move |_| {
                store.clear().context("clearing snapshot on close")
            })?;
        }

        let cache = metadata.clone();
        hub.subscribe(PROJECT_UPDATE, move |event| {
            let update: ProjectUpdate = serde_json::from_value(event.payload.clone())
                .context("malformed project-update payload")?;
            if !update.mcu.is_empty() {
                cache.select_device(&update.mcu)?;
            }
            Ok(())
        })?;

        Ok(Self {
            hub,
            snapshots,
            metadata,
            hover,
        })
    }

    /// Every row of the current snapshot. A row whose opcode is missing from the table
    /// still renders, with the lookup error in place of the mnemonic; a failed table fetch
    /// fails the call.
    pub async fn rows(&self) -> Result<Vec<RenderedRow>, MetadataError> {
        let Some(snapshot) = self.snapshots.snapshot() else {
            return Ok(Vec::new());
        };
        let mut rows = Vec::with_capacity(snapshot.len());
        for instr in snapshot.iter() {
            let raw = match self.metadata.get(instr.opcode_id).await {
                Ok(raw) => raw,
                Err(e @ MetadataError::UnknownOpcode { .. }) => {
                    log::warn!("row 0x{:x}: {}", instr.address, e);
                    unknown_opcode(instr)
                }
                Err(e) => return Err(e),
            };
            rows.push(render_row(instr, &raw));
        }
        Ok(rows)
    }

    /// Metadata for the hover popup of one row.
    pub async fn detail(&self, opcode_id: u32) -> Result<RawInstruction, MetadataError> {
        self.metadata.get(opcode_id).await
    }
}

fn apply_asm_update(
    store: &SnapshotStore,
    notifier: &dyn UiNotifier,
    event: &Event,
) -> anyhow::Result<()> {
    // The backend sends an empty payload when the project is closed.
    let instructions: Vec<Instruction> = match &event.payload {
        Value::Null => Vec::new(),
        payload => serde_json::from_value(payload.clone()).context("malformed asm-update payload")?,
    };
    if instructions.is_empty() {
        store.clear()?;
        return Ok(());
    }
    store.replace(instructions)?;
    // Once the live switch went out the reload marker has done its job.
    match notifier.switch_view(ActiveView::Disassembly) {
        Ok(()) => {
            store.take_active_view()?;
        }
        Err(e) => log::warn!("view switch not delivered, kept for next reload: {:#}", e),
    }
    Ok(())
}

fn unknown_opcode(instr: &Instruction) -> RawInstruction {
    RawInstruction {
        opcode: format!("<opcode {}>", instr.opcode_id),
        len: 1,
        name: String::new(),
        constraints: None,
        bin_mask: 0,
        bin_opcode: 0,
        action: String::new(),
        description: String::new(),
    }
}
