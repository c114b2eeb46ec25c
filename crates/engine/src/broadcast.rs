// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast adapter: bus events to channel-partitioned outbound messages.
//!
//! The transport (WebSocket fanout, an external collaborator) consumes the
//! receiver handed out at construction. Sends never block the bus: a full
//! outbound queue drops the message and bumps a counter.

use crate::bus::EventBus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sweep_core::{Clock, Event};
use sweep_wire::{Channel, OutboundMessage, StatsBody};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Channel an event is published on.
///
/// Failures and breaker events go to `alerts`; scan and cache events to
/// their own channels; remaining lifecycle traffic is `activity`. Stats
/// snapshots are produced by the orchestrator, not mapped from events.
pub fn channel_for(event: &Event) -> Channel {
    match event {
        Event::ScanStarted { .. }
        | Event::ScanProgress { .. }
        | Event::ScanCompleted { .. }
        | Event::ScanFailed { .. } => Channel::Scans,
        Event::CacheHit { .. } | Event::CacheMiss { .. } | Event::CacheInvalidated { .. } => {
            Channel::Cache
        }
        Event::JobFailed { .. }
        | Event::RetryExhausted { .. }
        | Event::CircuitOpened { .. }
        | Event::CircuitClosed { .. } => Channel::Alerts,
        _ => Channel::Activity,
    }
}

/// Converts bus events into [`OutboundMessage`]s for the transport.
#[derive(Clone)]
pub struct BroadcastAdapter {
    out_tx: mpsc::Sender<OutboundMessage>,
    dropped: Arc<AtomicU64>,
}

impl BroadcastAdapter {
    /// Returns the adapter and the receiver the transport drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (out_tx, out_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                out_tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            out_rx,
        )
    }

    /// Pump bus events into the outbound queue.
    pub fn attach<C: Clock>(&self, bus: &EventBus, clock: C) -> JoinHandle<()> {
        let adapter = self.clone();
        let mut stream = bus.subscribe();
        tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let message =
                    OutboundMessage::event(channel_for(&event), clock.epoch_ms(), &event);
                adapter.offer(message);
            }
        })
    }

    /// Non-blocking send; a saturated transport loses the message.
    pub fn offer(&self, message: OutboundMessage) {
        if self.out_tx.try_send(message).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Push a stats snapshot (called by the orchestrator on lifecycle
    /// transitions).
    pub fn send_stats(&self, stats: &StatsBody, epoch_ms: u64) {
        self.offer(OutboundMessage::stats(epoch_ms, stats));
    }

    /// Messages lost to a saturated transport.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
