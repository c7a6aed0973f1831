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

//! Named-event fan-out for updates pushed from outside the process.
//!
//! One `EventHub` is created at startup and shared (`Arc`) for the life of the process.
//! Each distinct event name is opened upstream exactly once, no matter how many local
//! callbacks subscribe to it; otherwise every event would arrive once per subscriber.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::HubError;

pub const ASM_UPDATE: &str = "asm-update";
pub const CLOSE_REQUESTED: &str = "close-requested";
pub const TAURI_CLOSE_REQUESTED: &str = "tauri://close-requested";
pub const PROJECT_UPDATE: &str = "project-update";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: Value,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

pub type Callback = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// The channel events arrive on. `open` asks the other side to start delivering `event`.
pub trait Upstream: Send + Sync {
    fn open(&self, event: &str) -> Result<(), HubError>;
}

impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    fn open(&self, event: &str) -> Result<(), HubError> {
        (**self).open(event)
    }
}

pub struct EventHub {
    upstream: Box<dyn Upstream>,
    listeners: Mutex<Vec<(String, Callback)>>,
    subscribed: Mutex<HashSet<String>>,
}

impl EventHub {
    pub fn new(upstream: impl Upstream + 'static) -> Self {
        Self {
            upstream: Box::new(upstream),
            listeners: Mutex::new(Vec::new()),
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    /// Register `callback` for `event`. The first subscription to a name opens the upstream
    /// channel. If that fails the callback stays registered and the next subscription to the
    /// same name tries again.
    pub fn subscribe<F>(&self, event: &str, callback: F) -> Result<(), HubError>
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.lock_listeners()
            .push((event.to_string(), Arc::new(callback)));

        let mut subscribed = self.subscribed.lock().unwrap_or_else(|e| e.into_inner());
        if subscribed.contains(event) {
            log::debug!("added local listener for '{}'", event);
            return Ok(());
        }
        self.upstream.open(event)?;
        subscribed.insert(event.to_string());
        log::info!("subscribed to '{}'", event);
        Ok(())
    }

    /// Deliver `event` to every callback registered under its name, in registration order.
    /// A failing or panicking callback is logged and does not stop the others. Returns the
    /// number of callbacks invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        log::debug!("received event '{}'", event.name);
        // Snapshot so callbacks can subscribe without deadlocking on the list.
        let targets: Vec<Callback> = self
            .lock_listeners()
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, cb)| cb.clone())
            .collect();

        for callback in &targets {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("listener for '{}' failed: {:#}", event.name, e),
                Err(_) => log::error!("listener for '{}' panicked", event.name),
            }
        }
        targets.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.lock_listeners()
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Forget every listener and upstream subscription.
    pub fn reset(&self) {
        self.lock_listeners().clear();
        self.subscribed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(String, Callback)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}
