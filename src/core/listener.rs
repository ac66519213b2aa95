use std::cell::Cell;

use log::{info, warn};

use super::step::ProcessResult;

/// Hooks invoked around a step execution.
///
/// Listeners are how callers attach timing, profiling or reporting to a run
/// without the dispatch loop knowing about it. Both hooks default to no-ops.
pub trait StepListener {
    /// Called once before the first item is read.
    fn before_step(&self, _name: &str) {}

    /// Called once with the final result, after every worker has finished.
    fn after_step(&self, _result: &ProcessResult) {}
}

/// Logs the outcome and elapsed time of every step it observes.
#[derive(Default)]
pub struct TimingListener {}

impl TimingListener {
    pub fn new() -> Self {
        Self {}
    }
}

impl StepListener for TimingListener {
    fn before_step(&self, name: &str) {
        info!("Start of step: {}", name);
    }

    fn after_step(&self, result: &ProcessResult) {
        match &result.error {
            None => info!(
                "End of step: {}, processed {} items in {:?}",
                result.name, result.count, result.duration
            ),
            Some(error) => info!(
                "Step {} stopped after {} items in {:?}: {}",
                result.name, result.count, result.duration, error
            ),
        }
    }
}

/// System memory in use, in KiB.
fn used_memory() -> Result<u64, sys_info::Error> {
    let info = sys_info::mem_info()?;
    Ok(info.total.saturating_sub(info.avail))
}

fn to_mib(kib: i64) -> f64 {
    kib as f64 / 1024.0
}

/// Logs the system memory in use and the load average around a step.
///
/// A snapshot is taken in `before_step`; `after_step` reports the memory
/// now in use, its growth since the snapshot and the one minute load
/// average. Platforms where the probes are unavailable only get a warning.
#[derive(Default)]
pub struct MemoryListener {
    used_at_start: Cell<Option<u64>>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory in use when the last observed step started, in KiB.
    pub fn used_at_start(&self) -> Option<u64> {
        self.used_at_start.get()
    }
}

impl StepListener for MemoryListener {
    fn before_step(&self, name: &str) {
        match used_memory() {
            Ok(used) => self.used_at_start.set(Some(used)),
            Err(err) => {
                warn!("Unable to read memory usage before step {}: {}", name, err);
                self.used_at_start.set(None);
            }
        }
    }

    fn after_step(&self, result: &ProcessResult) {
        let used = match used_memory() {
            Ok(used) => used,
            Err(err) => {
                warn!("Unable to read memory usage after step {}: {}", result.name, err);
                return;
            }
        };

        let growth = self
            .used_at_start
            .get()
            .map(|start| to_mib(used as i64 - start as i64));

        match sys_info::loadavg() {
            Ok(load) => info!(
                "Step {}: memory in use {:.1} MiB, growth {:+.1} MiB, load average {:.2}",
                result.name,
                to_mib(used as i64),
                growth.unwrap_or_default(),
                load.one
            ),
            Err(_) => info!(
                "Step {}: memory in use {:.1} MiB, growth {:+.1} MiB",
                result.name,
                to_mib(used as i64),
                growth.unwrap_or_default()
            ),
        }
    }
}
