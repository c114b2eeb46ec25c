// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory activity feed.

use crate::bus::EventBus;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use sweep_core::{ActivityRecord, Clock};
use tokio::task::JoinHandle;

/// Ring of the most recent activity records, for late subscribers.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<ActivityInner>>,
}

struct ActivityInner {
    ring: VecDeque<ActivityRecord>,
    cap: usize,
}

impl ActivityLog {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActivityInner {
                ring: VecDeque::new(),
                cap: cap.max(1),
            })),
        }
    }

    pub fn push(&self, record: ActivityRecord) {
        let mut inner = self.inner.lock();
        if inner.ring.len() == inner.cap {
            inner.ring.pop_front();
        }
        inner.ring.push_back(record);
    }

    /// Up to `n` most recent records, newest first.
    pub fn recent(&self, n: usize) -> Vec<ActivityRecord> {
        let inner = self.inner.lock();
        inner.ring.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ring.is_empty()
    }

    /// Pump bus events into the ring. Lag on this subscription is recorded
    /// as a `bus:drop` entry so overflow stays user-visible.
    pub fn attach<C: Clock>(&self, bus: &EventBus, clock: C) -> JoinHandle<()> {
        let log = self.clone();
        let mut stream = bus.subscribe();
        tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let lagged = stream.take_lagged();
                if lagged > 0 {
                    log.push(ActivityRecord::bus_drop(lagged, clock.epoch_ms()));
                }
                log.push(ActivityRecord::from_event(&event, clock.epoch_ms()));
            }
        })
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
