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

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// Records exchanged with the decoding backend and the UI. Field names follow the backend's
// camelCase JSON. The TypeScript side imports the generated bindings from shared/asm-view/.

/// Opcode id the backend uses for a word that did not decode to an instruction.
pub const DATA_WORD_OPCODE_ID: u32 = 999;

/// Reserved ids sitting next to the data word. They never index the table.
pub const REMINDER_OPCODE_ID: u32 = 998;
pub const EMPTY_OPCODE_ID: u32 = 1000;

const NOT_EXECUTABLE: &str = "custom instruction (not executable)";

/// Number of operand columns a row always has.
pub const OPERAND_SLOTS: usize = 3;

/// Constraint code of the padding operand used to fill unused columns.
pub const PLACEHOLDER_CONSTRAINT: &str = "-1";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
pub enum CommentDisplay {
    #[default]
    None,
    Bin,
    Dec,
    Oct,
    Hex,
    String,
}

impl fmt::Display for CommentDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Comment as the backend sends it: a decimal string most of the time, sometimes a bare number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawComment {
    Number(i64),
    Text(String),
}

impl Default for RawComment {
    fn default() -> Self {
        RawComment::Text(String::new())
    }
}

impl fmt::Display for RawComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawComment::Number(n) => write!(f, "{}", n),
            RawComment::Text(s) => f.write_str(s),
        }
    }
}

/// Register/field description attached by the backend's resolver (I/O register names for
/// port operands). When present it wins over the constraint table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
#[serde(rename_all = "camelCase")]
pub struct OperandInfo {
    pub register_name: String,
    pub register_mask: String, // JSON-encoded bitfield list, passed through untouched
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
#[serde(rename_all = "camelCase")]
pub struct Operand {
    pub constraint: String,
    #[ts(type = "number")]
    pub value: i64, // signed: relative branch offsets arrive negative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub operand_info: Option<OperandInfo>,
}

impl Operand {
    pub fn new(constraint: impl Into<String>, value: i64) -> Self {
        Self {
            constraint: constraint.into(),
            value,
            operand_info: None,
        }
    }

    /// Padding operand for an unused column. Renders as an empty cell.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_CONSTRAINT, 0)
    }

    pub fn with_info(mut self, info: OperandInfo) -> Self {
        self.operand_info = Some(info);
        self
    }
}

/// One disassembled line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub address: u32,
    pub opcode_id: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub operands: Vec<Operand>,
    #[serde(default)]
    #[ts(type = "number | string")]
    pub comment: RawComment,
    #[serde(default)]
    pub comment_display: CommentDisplay,
}

impl Instruction {
    pub fn new(address: u32, opcode_id: u32, operands: Vec<Operand>) -> Self {
        Self {
            address,
            opcode_id,
            operands,
            comment: RawComment::default(),
            comment_display: CommentDisplay::None,
        }
    }

    pub fn with_comment(mut self, comment: RawComment, display: CommentDisplay) -> Self {
        self.comment = comment;
        self.comment_display = display;
        self
    }

    /// The operand columns of this row: the real operands first, then placeholders up to
    /// `OPERAND_SLOTS`. Anything past the third operand is dropped.
    pub fn operand_slots(&self) -> [Operand; OPERAND_SLOTS] {
        if self.operands.len() > OPERAND_SLOTS {
            log::warn!(
                "instruction at 0x{:x} has {} operands, showing the first {}",
                self.address,
                self.operands.len(),
                OPERAND_SLOTS
            );
        }
        std::array::from_fn(|i| {
            self.operands
                .get(i)
                .cloned()
                .unwrap_or_else(Operand::placeholder)
        })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Operand>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Operand>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which bits of the opcode word feed which operand, e.g. `{ map: 0x01f0, constraint: 'd' }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
pub struct ConstraintMap {
    #[serde(rename = "map")]
    pub bitmap_index: u32,
    #[serde(rename = "constraint")]
    pub constraint_code: char,
}

/// Static description of one mnemonic, as returned by `get_instruction_list`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ts_rs::TS)]
#[ts(export, export_to = "../../../shared/asm-view/")]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub opcode: String,
    pub len: u8,
    pub name: String,
    #[serde(default)]
    pub constraints: Option<Vec<ConstraintMap>>,
    pub bin_mask: u16,
    pub bin_opcode: u16,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: String,
}

impl RawInstruction {
    /// Record shown for a raw data word (`DATA_WORD_OPCODE_ID`).
    pub fn data_word() -> Self {
        Self::custom(".word", "WORD", "raw data word (not an executable instruction)")
    }

    /// Synthetic record for one of the reserved ids, `None` for any other id.
    pub fn reserved(opcode_id: u32) -> Option<Self> {
        match opcode_id {
            DATA_WORD_OPCODE_ID => Some(Self::data_word()),
            REMINDER_OPCODE_ID => Some(Self::custom(".reminder", "REMINDER", NOT_EXECUTABLE)),
            EMPTY_OPCODE_ID => Some(Self::custom(".empty", "EMPTY", NOT_EXECUTABLE)),
            _ => None,
        }
    }

    fn custom(opcode: &str, name: &str, description: &str) -> Self {
        Self {
            opcode: opcode.to_string(),
            len: 1,
            name: name.to_string(),
            constraints: None,
            bin_mask: 0xff,
            bin_opcode: 0x00,
            action: "nothing".to_string(),
            description: description.to_string(),
        }
    }

    pub fn operand_count(&self) -> usize {
        self.constraints.as_ref().map_or(0, |c| c.len())
    }
}
