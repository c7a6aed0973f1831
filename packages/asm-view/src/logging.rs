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

/// Global logging setup
use std::sync::OnceLock;

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

/// Initialize logging. Must be called once at startup. Output goes to stderr because stdout
/// carries the framed protocol. `RUST_LOG` overrides the level chosen by `debug`.
pub fn init_logging(debug: bool) -> Result<(), FlexiLoggerError> {
    let default_level = if debug { "debug" } else { "info" };
    let handle = Logger::try_with_env_or_str(default_level)?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()?;
    LOGGER.set(handle).ok();
    Ok(())
}

/// Check if verbose logging was requested
pub fn is_debug() -> bool {
    log::log_enabled!(log::Level::Debug)
}
