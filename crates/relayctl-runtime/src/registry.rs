//! Ordered slot bookkeeping.
//!
//! Slots are addressed by position. Indices are always contiguous
//! `[0, len)`; removing a slot shifts every later slot down by one, which
//! renames its stream (`stream3` becomes `stream2`).

use std::time::Duration;

use relayctl_core::{MediaSource, SlotIndexError, SlotSnapshot};
use tracing::{debug, warn};

use crate::process::{ProcessHandle, StopOutcome};

/// One stream's bookkeeping unit.
#[derive(Debug)]
pub struct StreamSlot {
    source: MediaSource,
    running: bool,
    worker: Option<ProcessHandle>,
}

impl StreamSlot {
    fn new(source: MediaSource) -> Self {
        Self {
            source,
            running: false,
            worker: None,
        }
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Desired/observed running state. In declarative mode a slot can be
    /// running without an owned worker (the relay owns the transcoder).
    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub fn worker(&self) -> Option<&ProcessHandle> {
        self.worker.as_ref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.worker.as_ref().and_then(ProcessHandle::pid)
    }
}

/// Ordered list of slots plus the grace period used when stopping workers.
#[derive(Debug)]
pub struct StreamRegistry {
    slots: Vec<StreamSlot>,
    stop_grace: Duration,
}

impl StreamRegistry {
    pub const fn new(stop_grace: Duration) -> Self {
        Self {
            slots: Vec::new(),
            stop_grace,
        }
    }

    pub const fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StreamSlot> {
        self.slots.get(index)
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut StreamSlot, SlotIndexError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(SlotIndexError { index, len })
    }

    pub fn check_index(&self, index: usize) -> Result<(), SlotIndexError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(SlotIndexError {
                index,
                len: self.slots.len(),
            })
        }
    }

    pub fn contains(&self, source: &MediaSource) -> bool {
        self.slots.iter().any(|s| &s.source == source)
    }

    /// Append a stopped slot. Returns `false` (and changes nothing) when the
    /// source is already present.
    pub fn add(&mut self, source: MediaSource) -> bool {
        if self.contains(&source) {
            debug!(source = %source, "Duplicate source ignored");
            return false;
        }
        self.slots.push(StreamSlot::new(source));
        true
    }

    /// Remove a slot, stopping its worker first. Later slots shift down.
    pub async fn remove(&mut self, index: usize) -> Result<MediaSource, SlotIndexError> {
        self.check_index(index)?;
        self.stop_worker(index).await?;
        Ok(self.slots.remove(index).source)
    }

    /// Stop every worker and drop all slots.
    pub async fn clear(&mut self) {
        self.stop_all_workers().await;
        self.slots.clear();
    }

    /// Update a slot's running flag and worker in one step.
    ///
    /// Returns the worker that was displaced, if any; the caller decides how
    /// to stop it.
    pub fn set_running(
        &mut self,
        index: usize,
        running: bool,
        worker: Option<ProcessHandle>,
    ) -> Result<Option<ProcessHandle>, SlotIndexError> {
        let slot = self.slot_mut(index)?;
        slot.running = running;
        Ok(std::mem::replace(&mut slot.worker, worker))
    }

    /// Whether the slot is running and, if it owns a worker, that worker is
    /// still alive.
    pub fn is_live(&mut self, index: usize) -> Result<bool, SlotIndexError> {
        let slot = self.slot_mut(index)?;
        Ok(slot.running && slot.worker.as_mut().is_none_or(ProcessHandle::is_alive))
    }

    /// Mark a slot stopped and stop its worker, if any.
    ///
    /// Returns `None` when there was no worker to stop.
    pub async fn stop_worker(&mut self, index: usize) -> Result<Option<StopOutcome>, SlotIndexError> {
        let grace = self.stop_grace;
        let Some(worker) = self.set_running(index, false, None)? else {
            return Ok(None);
        };
        let outcome = worker.stop(grace).await;
        if outcome.is_timeout() {
            warn!(index, "Worker did not confirm exit within grace period");
        }
        Ok(Some(outcome))
    }

    /// Mark every slot stopped and stop every worker. Indices are unchanged.
    pub async fn stop_all_workers(&mut self) -> Vec<(usize, StopOutcome)> {
        let mut outcomes = Vec::new();
        for index in 0..self.slots.len() {
            if let Ok(Some(outcome)) = self.stop_worker(index).await {
                outcomes.push((index, outcome));
            }
        }
        outcomes
    }

    /// Detect workers that exited on their own.
    ///
    /// Such slots are marked stopped and their handles released. Returns the
    /// affected indices with exit codes.
    pub fn reap_exited(&mut self) -> Vec<(usize, Option<i32>)> {
        let mut exited = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(worker) = slot.worker.as_mut() else {
                continue;
            };
            if let Some(code) = worker.try_exit() {
                slot.running = false;
                slot.worker = None;
                exited.push((index, code));
            }
        }
        exited
    }

    pub fn sources(&self) -> Vec<MediaSource> {
        self.slots.iter().map(|s| s.source.clone()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|s| s.running).count()
    }

    pub fn running_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.running.then_some(i))
            .collect()
    }

    /// Running slots as `(index, source)` pairs, the input to relay config
    /// rendering.
    pub fn active_sources(&self) -> Vec<(usize, MediaSource)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.running)
            .map(|(i, s)| (i, s.source.clone()))
            .collect()
    }

    pub fn snapshot(&self, rtsp_port: u16) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| SlotSnapshot::new(i, s.source.clone(), s.running, rtsp_port, s.pid()))
            .collect()
    }
}
