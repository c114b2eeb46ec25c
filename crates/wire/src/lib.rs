// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sweep-wire: JSON DTOs for the external control surface.
//!
//! The HTTP + WebSocket transport and the MCP-style tool caller are external
//! collaborators; this crate pins the JSON shapes they exchange with the
//! orchestrator. Every operation takes a JSON value and returns a JSON
//! value.

mod error;
mod outbound;
mod request;
mod response;
mod tools;

pub use error::ErrorBody;
pub use outbound::{Channel, OutboundMessage, SubscribeRequest};
pub use request::{CreateMultiScanRequest, CreateScanRequest, JobsQuery, ScanOptions};
pub use response::{ControlAck, JobSnapshot, ScanCreated, StatsBody};
pub use tools::{tool_descriptors, ToolCall, ToolDescriptor, ToolError, ToolRequest};
