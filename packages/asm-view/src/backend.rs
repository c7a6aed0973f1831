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

//! Outbound commands to the decoding backend.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;

use crate::error::BackendError;
use crate::model::RawInstruction;

pub trait Backend: Send + Sync {
    /// `get_instruction_list`: the full opcode table, indexed by opcode id.
    fn get_instruction_list(
        &self,
    ) -> impl Future<Output = Result<Vec<RawInstruction>, BackendError>> + Send;

    /// `get_mcu_list`: names of the target devices the backend knows.
    fn get_mcu_list(&self) -> impl Future<Output = Result<BTreeSet<String>, BackendError>> + Send;
}

/// Backend whose command results were exported to JSON files.
pub struct FileBackend {
    instructions: PathBuf,
    devices: Option<PathBuf>,
}

impl FileBackend {
    pub fn new(instructions: impl Into<PathBuf>, devices: Option<PathBuf>) -> Self {
        Self {
            instructions: instructions.into(),
            devices,
        }
    }
}

impl Backend for FileBackend {
    async fn get_instruction_list(&self) -> Result<Vec<RawInstruction>, BackendError> {
        log::debug!("reading instruction table from {}", self.instructions.display());
        let bytes = tokio::fs::read(&self.instructions).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_mcu_list(&self) -> Result<BTreeSet<String>, BackendError> {
        let path = self
            .devices
            .as_ref()
            .ok_or_else(|| BackendError::Command("no device list configured".to_string()))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
