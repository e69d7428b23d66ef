// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger runner: one loop per registered sweep.
//!
//! Each loop sleeps until the sweep's next fire time, runs one cycle to
//! completion and logs the outcome. A per-sweep guard makes a trigger that
//! arrives while the same sweep is running skip instead of overlapping.

use crate::schedule::Schedule;
use crate::sweep::{Sweep, SweepReport};
use crate::SweepError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of asking a sweep to run
#[derive(Debug)]
pub enum RunOutcome {
    Completed(SweepReport),
    Failed(SweepError),
    /// The sweep was already running
    Skipped,
}

struct Entry {
    schedule: Schedule,
    sweep: Arc<dyn Sweep>,
    running: tokio::sync::Mutex<()>,
}

impl Entry {
    async fn run_once(&self) -> RunOutcome {
        let name = self.sweep.name();
        let Ok(_guard) = self.running.try_lock() else {
            debug!(sweep = name, "sweep already running, skipping trigger");
            return RunOutcome::Skipped;
        };
        match self.sweep.run().await {
            Ok(report) => {
                info!(sweep = name, %report, "sweep completed");
                RunOutcome::Completed(report)
            }
            Err(e) => {
                error!(sweep = name, error = %e, "sweep failed");
                RunOutcome::Failed(e)
            }
        }
    }

    async fn run_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let name = self.sweep.name();
        info!(sweep = name, schedule = %self.schedule, "sweep loop started");
        let mut last_fire: Option<DateTime<Utc>> = None;
        loop {
            let now = Utc::now();
            let base = last_fire.map_or(now, |last| last.max(now));
            let Some(next) = self.schedule.next_after(base) else {
                warn!(sweep = name, schedule = %self.schedule, "schedule has no further fire times");
                return;
            };
            let delay = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            last_fire = Some(next);
            self.run_once().await;
        }
        debug!(sweep = name, "sweep loop stopped");
    }
}

/// Owns the sweep loops and the shutdown token that stops them
pub struct Runner {
    entries: HashMap<String, Arc<Entry>>,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Runner {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { entries: HashMap::new(), shutdown, handles: Mutex::new(Vec::new()) }
    }

    /// Register `sweep` under its name. A later registration with the same
    /// name replaces the earlier one.
    pub fn register(&mut self, schedule: Schedule, sweep: impl Sweep) {
        let name = sweep.name().to_string();
        let entry = Entry { schedule, sweep: Arc::new(sweep), running: tokio::sync::Mutex::new(()) };
        if self.entries.insert(name.clone(), Arc::new(entry)).is_some() {
            warn!(sweep = %name, "replacing registered sweep");
        }
    }

    pub fn sweep_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Spawn one loop per registered sweep.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        for entry in self.entries.values() {
            handles.push(tokio::spawn(Arc::clone(entry).run_loop(self.shutdown.clone())));
        }
    }

    /// Run the named sweep now. Returns `None` for an unknown name.
    pub async fn trigger(&self, name: &str) -> Option<RunOutcome> {
        let entry = self.entries.get(name)?;
        Some(entry.run_once().await)
    }

    /// Stop all loops, waiting for in-flight cycles to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "sweep loop ended abnormally");
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
