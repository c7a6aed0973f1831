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

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::Instruction;
use crate::storage::{load_json, store_json, Storage, ACTIVE_VIEW_KEY, SNAPSHOT_KEY};

/// The panel the UI should show after it (re)loads.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    Home,
    #[serde(rename = "asm")]
    Disassembly,
}

/// The instruction list currently on screen. Empty or one whole snapshot, never a mix.
pub struct SnapshotStore {
    storage: Arc<dyn Storage>,
    current: RwLock<Option<Arc<[Instruction]>>>,
}

impl SnapshotStore {
    /// Open the store, restoring whatever snapshot was persisted before the last reload.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let restored = match load_json::<Vec<Instruction>>(storage.as_ref(), SNAPSHOT_KEY) {
            Ok(Some(list)) => {
                log::info!("restored disassembly snapshot ({} instructions)", list.len());
                Some(Arc::from(list))
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("discarding unreadable persisted snapshot: {}", e);
                if let Err(e) = storage.remove(SNAPSHOT_KEY) {
                    log::warn!("failed to remove persisted snapshot: {}", e);
                }
                None
            }
        };
        Self {
            storage,
            current: RwLock::new(restored),
        }
    }

    /// Replace the whole snapshot. Storage is written first, so a reload right after this
    /// returns sees the new list, and the active-view marker points the reloaded UI at the
    /// disassembly panel. If the list cannot be stored, memory and storage keep the old one.
    pub fn replace(&self, instructions: Vec<Instruction>) -> Result<Arc<[Instruction]>, StorageError> {
        let previous_marker = self.storage.get(ACTIVE_VIEW_KEY)?;
        store_json(self.storage.as_ref(), ACTIVE_VIEW_KEY, &ActiveView::Disassembly)?;
        if let Err(e) = store_json(self.storage.as_ref(), SNAPSHOT_KEY, &instructions) {
            let restored = match previous_marker {
                Some(marker) => self.storage.set(ACTIVE_VIEW_KEY, &marker),
                None => self.storage.remove(ACTIVE_VIEW_KEY),
            };
            if let Err(undo) = restored {
                log::warn!("failed to restore active-view marker: {}", undo);
            }
            return Err(e);
        }

        let snapshot: Arc<[Instruction]> = Arc::from(instructions);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        log::info!("disassembly snapshot replaced ({} instructions)", snapshot.len());
        Ok(snapshot)
    }

    /// Drop the snapshot, its persisted copy and any pending active-view marker. The
    /// instruction table is left alone.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.storage.remove(SNAPSHOT_KEY)?;
        self.storage.remove(ACTIVE_VIEW_KEY)?;
        log::info!("disassembly snapshot cleared");
        Ok(())
    }

    pub fn snapshot(&self) -> Option<Arc<[Instruction]>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_none()
    }

    pub fn find(&self, address: u32) -> Option<Instruction> {
        let snapshot = self.snapshot()?;
        // addresses are ascending within a snapshot
        snapshot
            .binary_search_by_key(&address, |i| i.address)
            .ok()
            .map(|ix| snapshot[ix].clone())
    }

    /// Read and clear the active-view marker. A second call returns `None`, so a plain
    /// reload later on does not jump to the disassembly panel again.
    pub fn take_active_view(&self) -> Result<Option<ActiveView>, StorageError> {
        let view = match load_json::<ActiveView>(self.storage.as_ref(), ACTIVE_VIEW_KEY) {
            Ok(view) => view,
            Err(StorageError::Serde(e)) => {
                log::warn!("ignoring unreadable active-view marker: {}", e);
                None
            }
            Err(e) => return Err(e),
        };
        self.storage.remove(ACTIVE_VIEW_KEY)?;
        Ok(view)
    }
}
