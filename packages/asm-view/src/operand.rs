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

//! Operand text for the disassembly table.
//!
//! The backend tags every operand with an AVR assembler constraint code (the same letters
//! binutils uses in its opcode table). The code decides how the raw field value is shown:
//! as a register, a pointer register, a hex immediate, a relative offset, and so on.

use std::fmt;

use crate::model::{Operand, OperandInfo, PLACEHOLDER_CONSTRAINT};

/// Shown when an `e`/`b` operand carries a value with no pointer register behind it.
pub const CANT_DECODE: &str = "cant decode";

/// Every constraint code the table knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    AnyRegister,       // r: r0-r31
    UpperRegister,     // d: ldi register r16-r31
    EvenRegister,      // v: movw register r0, r2, ..., r30
    MulRegister,       // a: fmul register r16-r23
    WordRegister,      // w: adiw register r24, r26, r28, r30
    PointerRegister,   // e: X, Y or Z
    BasePointer,       // b: Y or Z with displacement
    ZPostIncrement,    // z: Z / Z+ for [e]lpm
    Byte,              // M: 0..255
    InvertedByte,      // n: 0..255, n = ~M
    Bit,               // s: 0..7
    IoPort,            // P: 0..63 (in, out)
    LowIoPort,         // p: 0..31 (cbi, sbi, sbic, sbis)
    WordImmediate,     // K: 0..63 (adiw, sbiw)
    Immediate,         // i
    DataAddress,       // j: 7 bit address for 16-bit lds/sts
    ShortBranch,       // l: -64..63
    LongBranch,        // L: -2048..2047
    CodeAddress,       // h: call, jmp
    BitShifted,        // S: s << 4
    NibbleShifted,     // E: 0..15 << 4 (des)
    Decimal,           // o
    Placeholder,       // -1: padding column
    Unknown(String),
}

/// How a constraint's value is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Register,
    PointerXyz,
    PointerYz,
    PostIncrement,
    Hex,
    Relative,
    Decimal,
    Empty,
    Invalid,
}

impl Constraint {
    pub fn parse(code: &str) -> Self {
        match code {
            "r" => Constraint::AnyRegister,
            "d" => Constraint::UpperRegister,
            "v" => Constraint::EvenRegister,
            "a" => Constraint::MulRegister,
            "w" => Constraint::WordRegister,
            "e" => Constraint::PointerRegister,
            "b" => Constraint::BasePointer,
            "z" => Constraint::ZPostIncrement,
            "M" => Constraint::Byte,
            "n" => Constraint::InvertedByte,
            "s" => Constraint::Bit,
            "P" => Constraint::IoPort,
            "p" => Constraint::LowIoPort,
            "K" => Constraint::WordImmediate,
            "i" => Constraint::Immediate,
            "j" => Constraint::DataAddress,
            "l" => Constraint::ShortBranch,
            "L" => Constraint::LongBranch,
            "h" => Constraint::CodeAddress,
            "S" => Constraint::BitShifted,
            "E" => Constraint::NibbleShifted,
            "o" => Constraint::Decimal,
            PLACEHOLDER_CONSTRAINT => Constraint::Placeholder,
            other => Constraint::Unknown(other.to_string()),
        }
    }

    pub fn kind(&self) -> OperandKind {
        match self {
            Constraint::AnyRegister
            | Constraint::UpperRegister
            | Constraint::EvenRegister
            | Constraint::MulRegister
            | Constraint::WordRegister => OperandKind::Register,
            Constraint::PointerRegister => OperandKind::PointerXyz,
            Constraint::BasePointer => OperandKind::PointerYz,
            Constraint::ZPostIncrement => OperandKind::PostIncrement,
            Constraint::Byte
            | Constraint::InvertedByte
            | Constraint::Bit
            | Constraint::IoPort
            | Constraint::LowIoPort
            | Constraint::WordImmediate
            | Constraint::Immediate
            | Constraint::DataAddress
            | Constraint::CodeAddress
            | Constraint::BitShifted
            | Constraint::NibbleShifted => OperandKind::Hex,
            Constraint::ShortBranch | Constraint::LongBranch => OperandKind::Relative,
            Constraint::Decimal => OperandKind::Decimal,
            Constraint::Placeholder => OperandKind::Empty,
            Constraint::Unknown(_) => OperandKind::Invalid,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Constraint::AnyRegister => "r",
            Constraint::UpperRegister => "d",
            Constraint::EvenRegister => "v",
            Constraint::MulRegister => "a",
            Constraint::WordRegister => "w",
            Constraint::PointerRegister => "e",
            Constraint::BasePointer => "b",
            Constraint::ZPostIncrement => "z",
            Constraint::Byte => "M",
            Constraint::InvertedByte => "n",
            Constraint::Bit => "s",
            Constraint::IoPort => "P",
            Constraint::LowIoPort => "p",
            Constraint::WordImmediate => "K",
            Constraint::Immediate => "i",
            Constraint::DataAddress => "j",
            Constraint::ShortBranch => "l",
            Constraint::LongBranch => "L",
            Constraint::CodeAddress => "h",
            Constraint::BitShifted => "S",
            Constraint::NibbleShifted => "E",
            Constraint::Decimal => "o",
            Constraint::Placeholder => PLACEHOLDER_CONSTRAINT,
            Constraint::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Render one operand cell. Never fails: a code outside the table produces a diagnostic
/// string in the cell instead of breaking the row.
pub fn render_operand(constraint: &str, value: i64, info: Option<&OperandInfo>) -> String {
    if let Some(info) = info {
        return info.register_name.clone();
    }
    let constraint = Constraint::parse(constraint);
    match constraint.kind() {
        OperandKind::Register => format!("r{}", value),
        OperandKind::PointerXyz => match value {
            3 => "X".to_string(),
            2 => "Y".to_string(),
            0 => "Z".to_string(),
            _ => CANT_DECODE.to_string(),
        },
        OperandKind::PointerYz => match value {
            0 => "Z".to_string(),
            1 => "Y".to_string(),
            _ => CANT_DECODE.to_string(),
        },
        OperandKind::PostIncrement => {
            if value != 0 {
                "Z+".to_string()
            } else {
                String::new()
            }
        }
        OperandKind::Hex => hex(value),
        OperandKind::Relative => format!(".{}", value),
        OperandKind::Decimal => value.to_string(),
        OperandKind::Empty => String::new(),
        OperandKind::Invalid => format!("error invalid constraint: {}", constraint),
    }
}

/// Convenience wrapper over `render_operand` for a whole `Operand`.
pub fn render(operand: &Operand) -> String {
    render_operand(
        &operand.constraint,
        operand.value,
        operand.operand_info.as_ref(),
    )
}

fn hex(value: i64) -> String {
    if value < 0 {
        format!("-0x{:x}", value.unsigned_abs())
    } else {
        format!("0x{:x}", value)
    }
}
