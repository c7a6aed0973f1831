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

use crate::error::CommentError;
use crate::model::{CommentDisplay, RawComment};

/// Render a comment cell under the requested base.
///
/// The backend stores numeric comments (branch targets and the like) as decimal text, so
/// `Bin`, `Oct` and `Hex` parse base 10 first. Octal uses the `0c` prefix the viewer has
/// always shown.
pub fn render_comment(raw: &RawComment, display: CommentDisplay) -> Result<String, CommentError> {
    let prefix = match display {
        CommentDisplay::None => return Ok(String::new()),
        CommentDisplay::String => return Ok(raw.to_string()),
        CommentDisplay::Dec => "",
        CommentDisplay::Bin => "0b",
        CommentDisplay::Oct => "0c",
        CommentDisplay::Hex => "0x",
    };

    let value = parse_decimal(raw).ok_or_else(|| CommentError::NotNumeric {
        raw: raw.to_string(),
        display,
    })?;
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let digits = match display {
        CommentDisplay::Bin => format!("{:b}", magnitude),
        CommentDisplay::Oct => format!("{:o}", magnitude),
        CommentDisplay::Hex => format!("{:x}", magnitude),
        _ => magnitude.to_string(),
    };
    Ok(format!("{}{}{}", sign, prefix, digits))
}

fn parse_decimal(raw: &RawComment) -> Option<i64> {
    match raw {
        RawComment::Number(n) => Some(*n),
        RawComment::Text(s) => s.trim().parse::<i64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawComment {
        RawComment::Text(s.to_string())
    }

    #[test]
    fn bases() {
        assert_eq!(render_comment(&text("10"), CommentDisplay::Hex).unwrap(), "0xa");
        assert_eq!(render_comment(&text("10"), CommentDisplay::Bin).unwrap(), "0b1010");
        assert_eq!(render_comment(&text("10"), CommentDisplay::Oct).unwrap(), "0c12");
        assert_eq!(render_comment(&text("10"), CommentDisplay::Dec).unwrap(), "10");
        assert_eq!(render_comment(&text("10"), CommentDisplay::None).unwrap(), "");
    }

    #[test]
    fn string_mode_is_verbatim() {
        assert_eq!(
            render_comment(&text("anything"), CommentDisplay::String).unwrap(),
            "anything"
        );
        assert_eq!(render_comment(&text(" 007 "), CommentDisplay::String).unwrap(), " 007 ");
    }

    #[test]
    fn numeric_raw_values() {
        assert_eq!(
            render_comment(&RawComment::Number(255), CommentDisplay::Hex).unwrap(),
            "0xff"
        );
        assert_eq!(
            render_comment(&RawComment::Number(-2), CommentDisplay::Hex).unwrap(),
            "-0x2"
        );
        assert_eq!(render_comment(&text(" 8 "), CommentDisplay::Oct).unwrap(), "0c10");
    }

    #[test]
    fn not_numeric_is_an_error_not_zero() {
        let err = render_comment(&text("NaN"), CommentDisplay::Hex).unwrap_err();
        assert_eq!(
            err,
            CommentError::NotNumeric {
                raw: "NaN".to_string(),
                display: CommentDisplay::Hex
            }
        );
        assert!(render_comment(&text(""), CommentDisplay::Dec).is_err());
        assert_eq!(render_comment(&text("0"), CommentDisplay::Dec).unwrap(), "0");
    }
}
