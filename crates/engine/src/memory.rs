// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process RSS sampling and backpressure gating (§4.10).
//!
//! RSS is sampled at checkpoint boundaries only (decided in DESIGN.md's
//! open-question log), never mid-document, so a single large in-flight
//! extraction can't be mistaken for a leak. `MemoryMonitor` is the engine's
//! own view of that sample; `GovernorMemoryMargin` adapts it to the
//! extractor crate's narrower `MemoryMargin` seam so the PDF extractor
//! never needs to know about `sysinfo`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sysinfo::{Pid, System};

use scanctl_adapters::MemoryMargin;

/// Outcome of a checkpoint-boundary RSS check (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySignal {
    /// RSS is below `warn_rss_mb`; proceed normally.
    Normal,
    /// RSS is at or above `warn_rss_mb` but below `pause_rss_mb`; the
    /// worker should cool down (skip OCR, shed cache) but keep running.
    Warn,
    /// RSS is at or above `pause_rss_mb`; the job must pause at the next
    /// checkpoint boundary.
    Pause,
}

/// Samples this process's resident set size.
pub trait MemoryMonitor: Send + Sync + 'static {
    /// Current RSS in megabytes.
    fn rss_mb(&self) -> u64;

    /// Classify the current RSS against the given thresholds.
    fn signal(&self, warn_rss_mb: u64, pause_rss_mb: u64) -> MemorySignal {
        let rss = self.rss_mb();
        if rss >= pause_rss_mb {
            MemorySignal::Pause
        } else if rss >= warn_rss_mb {
            MemorySignal::Warn
        } else {
            MemorySignal::Normal
        }
    }
}

/// Reads RSS for the current process via `sysinfo`.
pub struct SysinfoMemoryMonitor {
    pid: Pid,
}

impl SysinfoMemoryMonitor {
    pub fn new() -> Self {
        Self {
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SysinfoMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMonitor for SysinfoMemoryMonitor {
    fn rss_mb(&self) -> u64 {
        let mut system = System::new();
        system.refresh_process(self.pid);
        system
            .process(self.pid)
            .map(|p| p.memory() / (1024 * 1024))
            .unwrap_or(0)
    }
}

/// A monitor with a settable RSS value, for deterministic backpressure
/// tests without spawning a real process under memory pressure.
pub struct FakeMemoryMonitor {
    rss_mb: AtomicU64,
}

impl FakeMemoryMonitor {
    pub fn new(rss_mb: u64) -> Self {
        Self {
            rss_mb: AtomicU64::new(rss_mb),
        }
    }

    pub fn set_rss_mb(&self, rss_mb: u64) {
        self.rss_mb.store(rss_mb, Ordering::SeqCst);
    }
}

impl MemoryMonitor for FakeMemoryMonitor {
    fn rss_mb(&self) -> u64 {
        self.rss_mb.load(Ordering::SeqCst)
    }
}

/// Adapts a [`MemoryMonitor`] into the extractor crate's `MemoryMargin`
/// seam, gating OCR on the same `warn_rss_mb` threshold the worker uses
/// for its own cooldown decision — once a job is warned, starting the
/// heavier OCR path on the next document would only make things worse.
pub struct GovernorMemoryMargin<M: MemoryMonitor> {
    monitor: Arc<M>,
    warn_rss_mb: u64,
}

impl<M: MemoryMonitor> GovernorMemoryMargin<M> {
    pub fn new(monitor: Arc<M>, warn_rss_mb: u64) -> Self {
        Self {
            monitor,
            warn_rss_mb,
        }
    }
}

impl<M: MemoryMonitor> MemoryMargin for GovernorMemoryMargin<M> {
    fn has_margin(&self) -> bool {
        self.monitor.rss_mb() < self.warn_rss_mb
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
