// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound broadcast envelope.
//!
//! The transport filters subscribers by channel; a subscriber sends
//! `{subscribe: [channels]}`, the server echoes current stats and begins
//! streaming.

use crate::response::StatsBody;
use serde::{Deserialize, Serialize};
use sweep_core::Event;

/// Named topics on the broadcast fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Scans,
    Alerts,
    Cache,
    Stats,
    Activity,
}

sweep_core::simple_display! {
    Channel {
        Scans => "scans",
        Alerts => "alerts",
        Cache => "cache",
        Stats => "stats",
        Activity => "activity",
    }
}

/// `{type, channel, timestamp, payload}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: Channel,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub payload: serde_json::Value,
}

impl OutboundMessage {
    /// Wrap a lifecycle event for its channel.
    pub fn event(channel: Channel, timestamp: u64, event: &Event) -> Self {
        Self {
            kind: event.tag().to_string(),
            channel,
            timestamp,
            payload: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Stats snapshot for the `stats` channel.
    pub fn stats(timestamp: u64, stats: &StatsBody) -> Self {
        Self {
            kind: "stats".to_string(),
            channel: Channel::Stats,
            timestamp,
            payload: serde_json::to_value(stats).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Inbound channel opt-in: `{subscribe: [channels]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscribeRequest {
    pub subscribe: Vec<Channel>,
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
