// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed fan-out event bus.
//!
//! `publish` never blocks the publisher. Each subscriber gets a bounded
//! buffer; a subscriber that falls behind loses the oldest events for that
//! subscriber only, and the loss is counted (surfaced through the activity
//! log as `bus:drop`). Delivery is at-most-once per subscriber, in publish
//! order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sweep_core::Event;
use tokio::sync::broadcast;

/// In-process publish/subscribe fabric for lifecycle events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// `subscriber_buffer` bounds each subscriber's backlog.
    pub fn new(subscriber_buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(subscriber_buffer.max(1));
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish to all current subscribers. Non-blocking; a bus with no
    /// subscribers silently discards.
    pub fn publish(&self, event: Event) {
        tracing::trace!(event = %event.log_summary(), "publish");
        let _ = self.tx.send(event);
    }

    /// Subscribe to every event from this point on.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
            filter: None,
            dropped: Arc::clone(&self.dropped),
            lagged: 0,
        }
    }

    /// Subscribe with a predicate; non-matching events are consumed and
    /// discarded without surfacing.
    pub fn subscribe_filtered(
        &self,
        predicate: impl Fn(&Event) -> bool + Send + 'static,
    ) -> EventStream {
        let mut stream = self.subscribe();
        stream.filter = Some(Box::new(predicate));
        stream
    }

    /// Total events dropped across all subscribers since startup.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's view of the bus.
pub struct EventStream {
    rx: broadcast::Receiver<Event>,
    filter: Option<Box<dyn Fn(&Event) -> bool + Send>>,
    dropped: Arc<AtomicU64>,
    lagged: u64,
}

impl EventStream {
    /// Next matching event in publish order, or `None` once the bus is
    /// closed and drained. Overflow is absorbed: the drop count is recorded
    /// and delivery resumes from the oldest retained event.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => self.note_lag(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(_) => return None,
            }
        }
    }

    /// Events this subscriber has lost since the last call.
    pub fn take_lagged(&mut self) -> u64 {
        std::mem::take(&mut self.lagged)
    }

    fn matches(&self, event: &Event) -> bool {
        self.filter.as_ref().map(|f| f(event)).unwrap_or(true)
    }

    fn note_lag(&mut self, n: u64) {
        self.lagged += n;
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
