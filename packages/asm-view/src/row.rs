use serde::Serialize;

use crate::comment::render_comment;
use crate::error::CommentError;
use crate::model::{Instruction, RawInstruction, OPERAND_SLOTS};
use crate::operand;

/// One table row, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub address: String,
    pub mnemonic: String,
    pub operands: [String; OPERAND_SLOTS],
    pub comment: Result<String, CommentError>,
}

pub fn render_row(instr: &Instruction, raw: &RawInstruction) -> RenderedRow {
    let operands = instr.operand_slots().map(|op| operand::render(&op));
    RenderedRow {
        address: format!("0x{:x}", instr.address),
        mnemonic: raw.opcode.clone(),
        operands,
        comment: render_comment(&instr.comment, instr.comment_display),
    }
}

impl RenderedRow {
    /// Tab separated text line, used by the `render` subcommand.
    pub fn format_line(&self) -> String {
        let comment = match &self.comment {
            Ok(text) if text.is_empty() => String::new(),
            Ok(text) => format!("; {}", text),
            Err(e) => format!("; <{}>", e),
        };
        format!(
            "{}:\t{}\t{}\t{}",
            self.address,
            self.mnemonic,
            self.operand_text(),
            comment
        )
        .trim_end()
        .to_string()
    }

    /// Non-empty operand cells joined the way an assembler listing shows them.
    pub fn operand_text(&self) -> String {
        self.operands
            .iter()
            .filter(|o| !o.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Wire form of a row for the helper protocol. A comment that failed to parse goes out as
/// `commentError` so the UI can mark it instead of printing a bogus number.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SerRow {
    pub address: String,
    pub mnemonic: String,
    pub operands: [String; OPERAND_SLOTS],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_error: Option<String>,
}

impl From<RenderedRow> for SerRow {
    fn from(row: RenderedRow) -> Self {
        let (comment, comment_error) = match row.comment {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            address: row.address,
            mnemonic: row.mnemonic,
            operands: row.operands,
            comment,
            comment_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommentDisplay, Operand, RawComment};

    fn ldi() -> RawInstruction {
        RawInstruction {
            opcode: "ldi".to_string(),
            len: 1,
            name: "LDI".to_string(),
            constraints: None,
            bin_mask: 0xf000,
            bin_opcode: 0xe000,
            action: "Rd <- K".to_string(),
            description: "Load Immediate".to_string(),
        }
    }

    #[test]
    fn row_has_three_operand_columns() {
        let instr = Instruction::new(0x1a, 3, vec![Operand::new("d", 16), Operand::new("M", 255)]);
        let row = render_row(&instr, &ldi());
        assert_eq!(row.address, "0x1a");
        assert_eq!(row.mnemonic, "ldi");
        assert_eq!(row.operands, ["r16".to_string(), "0xff".to_string(), String::new()]);
        assert_eq!(row.comment, Ok(String::new()));
        assert_eq!(row.format_line(), "0x1a:\tldi\tr16, 0xff");
    }

    #[test]
    fn comment_error_stays_in_its_cell() {
        let instr = Instruction::new(0, 3, vec![])
            .with_comment(RawComment::Text("oops".to_string()), CommentDisplay::Hex);
        let row = render_row(&instr, &ldi());
        assert!(row.comment.is_err());
        assert!(row.format_line().contains("<comment"));

        let wire = SerRow::from(row);
        assert!(wire.comment.is_none());
        assert!(wire.comment_error.is_some());
    }

    #[test]
    fn data_word_row() {
        let instr = Instruction::new(0x40, crate::model::DATA_WORD_OPCODE_ID, vec![])
            .with_comment(RawComment::Number(4660), CommentDisplay::Hex);
        let row = render_row(&instr, &RawInstruction::data_word());
        assert_eq!(row.format_line(), "0x40:\t.word\t\t; 0x1234");
    }
}
