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

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::{self, BufRead, BufReader, Read, Write};

/// Reads `Content-Length` framed JSON messages (the DAP/LSP framing) from any `BufRead`.
pub struct FramedReader<R> {
    reader: R,
}

pub type StdioReader = FramedReader<BufReader<io::Stdin>>;

impl StdioReader {
    pub fn stdin() -> Self {
        FramedReader::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead> FramedReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Next message, or `None` on a clean EOF between messages.
    pub fn read_message(&mut self) -> Result<Option<Value>> {
        let mut content_length: Option<usize> = None;
        let mut saw_header = false;
        loop {
            let mut header_line = String::new();
            let n = self.reader.read_line(&mut header_line)?;
            if n == 0 {
                if saw_header {
                    bail!("EOF while reading header");
                }
                return Ok(None);
            }
            let header_trim = header_line.trim();
            if header_trim.is_empty() {
                if saw_header {
                    break; // end of headers
                }
                continue;
            }
            saw_header = true;
            if header_trim.to_lowercase().starts_with("content-length") {
                if let Some(idx) = header_trim.find(':') {
                    let num = header_trim[idx + 1..].trim();
                    content_length = Some(num.parse::<usize>().context("bad Content-Length")?);
                }
            }
            // ignore other headers
        }

        let len = content_length.context("Missing Content-Length header")?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        let v: Value = serde_json::from_slice(&buf)?;
        Ok(Some(v))
    }
}

/// Write one framed message to `w`.
pub fn write_framed<W: Write>(w: &mut W, msg: &Value) -> Result<()> {
    let body = serde_json::to_vec(msg)?;
    write!(w, "Content-Length: {}\r\n\r\n", body.len())?;
    w.write_all(&body)?;
    w.flush()?;
    Ok(())
}

/// Write a framed message to stdout while holding stdout's lock, so responses from the
/// request loop and notifications from background tasks never interleave.
pub fn write_json_locked(msg: &Value) -> Result<()> {
    let stdout = io::stdout();
    let mut w = stdout.lock();
    write_framed(&mut w, msg)
}
