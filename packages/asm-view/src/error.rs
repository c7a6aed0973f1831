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

//! Error types shared across the crate. Rendering never fails loudly (bad constraint codes
//! become inline text); lookups, fetches and storage do, and go back to the immediate caller.

use thiserror::Error;

use crate::model::CommentDisplay;

/// Failure of an outbound backend command (`get_instruction_list`, `get_mcu_list`).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend returned malformed data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The snapshot references an opcode the table does not know. Usually a stale table
    /// left over from another target device.
    #[error("opcode id {opcode_id} not found in instruction table ({table_len} entries)")]
    UnknownOpcode { opcode_id: u32, table_len: usize },
    #[error("failed to fetch instruction table: {0}")]
    Fetch(#[from] BackendError),
}

/// A comment that cannot be shown under the requested numeric base.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommentError {
    #[error("comment {raw:?} is not a decimal number (display: {display})")]
    NotNumeric { raw: String, display: CommentDisplay },
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("failed to open upstream channel for '{event}': {reason}")]
    Upstream { event: String, reason: String },
}
