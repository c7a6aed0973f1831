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

//! Instruction detail popup shown after the pointer rests on a row.
//!
//! Fetches are never cancelled. Instead every `enter`/`leave` bumps a generation counter and
//! a result is only shown if its ticket still carries the current generation.

use std::sync::Mutex;
use std::time::Duration;

use crate::backend::Backend;
use crate::error::MetadataError;
use crate::metadata::MetadataCache;
use crate::model::RawInstruction;

pub const DEFAULT_HOVER_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub address: u32,
    pub instruction: RawInstruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTicket {
    address: u32,
    generation: u64,
}

impl HoverTicket {
    pub fn address(&self) -> u32 {
        self.address
    }
}

#[derive(Default)]
struct HoverState {
    generation: u64,
    shown: Option<Detail>,
}

pub struct HoverDetail {
    delay: Duration,
    state: Mutex<HoverState>,
}

impl Default for HoverDetail {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_DELAY)
    }
}

impl HoverDetail {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Mutex::new(HoverState::default()),
        }
    }

    /// Pointer entered the row at `address`.
    pub fn enter(&self, address: u32) -> HoverTicket {
        let mut state = self.lock();
        state.generation += 1;
        state.shown = None;
        HoverTicket {
            address,
            generation: state.generation,
        }
    }

    /// Pointer left. Hides the popup and makes every outstanding ticket stale.
    pub fn leave(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.shown = None;
    }

    /// Show `instruction` for `ticket` unless the pointer has moved on. Returns whether
    /// the detail is now visible.
    pub fn complete(&self, ticket: HoverTicket, instruction: RawInstruction) -> bool {
        let mut state = self.lock();
        if state.generation != ticket.generation {
            log::debug!("dropping stale detail for 0x{:x}", ticket.address);
            return false;
        }
        state.shown = Some(Detail {
            address: ticket.address,
            instruction,
        });
        true
    }

    pub fn visible(&self) -> Option<Detail> {
        self.lock().shown.clone()
    }

    /// Wait out the hover delay, resolve `opcode_id` and complete `ticket`.
    pub async fn show_after_delay<B: Backend>(
        &self,
        ticket: HoverTicket,
        opcode_id: u32,
        cache: &MetadataCache<B>,
    ) -> Result<bool, MetadataError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.lock().generation != ticket.generation {
            return Ok(false);
        }
        let instruction = cache.get(opcode_id).await?;
        Ok(self.complete(ticket, instruction))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HoverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
