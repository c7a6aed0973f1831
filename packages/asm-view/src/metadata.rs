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

//! Opcode id -> `RawInstruction` lookup.
//!
//! The table comes from the backend's `get_instruction_list` command and is fetched at most
//! once per cold cache. It is persisted so the next session starts warm, and it is all or
//! nothing: either the whole table is installed or none of it is.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::backend::Backend;
use crate::error::{BackendError, MetadataError, StorageError};
use crate::model::RawInstruction;
use crate::storage::{load_json, store_json, Storage, INSTRUCTION_TABLE_KEY, SELECTED_MCU_KEY};

pub type InstructionTable = Arc<Vec<RawInstruction>>;

pub struct MetadataCache<B> {
    backend: B,
    storage: Arc<dyn Storage>,
    table: RwLock<Option<InstructionTable>>,
    // Held across the backend call so concurrent misses wait for one fetch.
    fetch_gate: tokio::sync::Mutex<()>,
    // Bumped by every invalidation; a fetch that started under an older value is discarded.
    generation: AtomicU64,
    // Serializes invalidation against the check-and-persist step after a fetch.
    persist_lock: Mutex<()>,
}

impl<B: Backend> MetadataCache<B> {
    pub fn new(backend: B, storage: Arc<dyn Storage>) -> Self {
        Self {
            backend,
            storage,
            table: RwLock::new(None),
            fetch_gate: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            persist_lock: Mutex::new(()),
        }
    }

    /// Metadata for one opcode id, populating the table on first use.
    pub async fn get(&self, opcode_id: u32) -> Result<RawInstruction, MetadataError> {
        let table = self.table().await?;
        resolve(&table, opcode_id)
    }

    /// The whole table, populating it on first use.
    pub async fn table(&self) -> Result<InstructionTable, MetadataError> {
        if let Some(table) = self.cached() {
            return Ok(table);
        }

        let _gate = self.fetch_gate.lock().await;
        // Another caller may have filled the table while we waited on the gate.
        if let Some(table) = self.cached() {
            return Ok(table);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        if let Some(table) = self.load_persisted() {
            log::debug!("instruction table restored from storage ({} entries)", table.len());
            self.install(generation, table.clone());
            return Ok(table);
        }

        log::info!("fetching instruction table from backend");
        let table: InstructionTable = Arc::new(self.backend.get_instruction_list().await?);
        log::info!("instruction table fetched ({} entries)", table.len());

        let _persist = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            log::warn!("instruction table invalidated during fetch, result not cached");
            return Ok(table);
        }
        if let Err(e) = store_json(self.storage.as_ref(), INSTRUCTION_TABLE_KEY, table.as_ref()) {
            log::warn!("failed to persist instruction table: {}", e);
        }
        self.install(generation, table.clone());
        Ok(table)
    }

    /// Number of entries if the table is populated.
    pub fn table_len(&self) -> Option<usize> {
        self.cached().map(|t| t.len())
    }

    /// Drop the table from memory and storage. The next lookup fetches again.
    pub fn invalidate(&self) -> Result<(), StorageError> {
        let _persist = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.storage.remove(INSTRUCTION_TABLE_KEY)?;
        log::info!("instruction table invalidated");
        Ok(())
    }

    /// Record the selected target device. Returns true if the selection changed from a
    /// previously recorded device and the table was invalidated.
    pub fn select_device(&self, mcu: &str) -> Result<bool, StorageError> {
        let previous = self.storage.get(SELECTED_MCU_KEY)?;
        if previous.as_deref() == Some(mcu) {
            return Ok(false);
        }
        self.storage.set(SELECTED_MCU_KEY, mcu)?;
        match previous {
            Some(previous) => {
                log::info!("target device changed: {} -> {}", previous, mcu);
                self.invalidate()?;
                Ok(true)
            }
            None => {
                log::debug!("target device selected: {}", mcu);
                Ok(false)
            }
        }
    }

    /// `get_mcu_list` passthrough.
    pub async fn devices(&self) -> Result<BTreeSet<String>, BackendError> {
        self.backend.get_mcu_list().await
    }

    fn cached(&self) -> Option<InstructionTable> {
        self.table.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn install(&self, generation: u64, table: InstructionTable) {
        if self.generation.load(Ordering::SeqCst) == generation {
            *self.table.write().unwrap_or_else(|e| e.into_inner()) = Some(table);
        }
    }

    fn load_persisted(&self) -> Option<InstructionTable> {
        match load_json::<Vec<RawInstruction>>(self.storage.as_ref(), INSTRUCTION_TABLE_KEY) {
            Ok(table) => table.map(Arc::new),
            Err(e) => {
                log::warn!("ignoring unreadable persisted instruction table: {}", e);
                None
            }
        }
    }
}

fn resolve(table: &[RawInstruction], opcode_id: u32) -> Result<RawInstruction, MetadataError> {
    if let Some(raw) = table.get(opcode_id as usize) {
        return Ok(raw.clone());
    }
    if let Some(raw) = RawInstruction::reserved(opcode_id) {
        return Ok(raw);
    }
    Err(MetadataError::UnknownOpcode {
        opcode_id,
        table_len: table.len(),
    })
}
