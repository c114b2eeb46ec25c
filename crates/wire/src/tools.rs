// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The enumerated tool surface.
//!
//! A minimal tool list mirroring the control surface, consumed by an
//! MCP-style tool caller. Input schemas match the control operations;
//! outputs are JSON summaries produced by the daemon's dispatcher.

use crate::request::{CreateMultiScanRequest, CreateScanRequest, JobsQuery};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// A tool invocation as received from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Static description of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Tool-call parsing failures.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {detail}")]
    BadArguments { tool: String, detail: String },
}

/// A parsed, typed tool request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ScanRepository(CreateScanRequest),
    ScanMultipleRepositories(CreateMultiScanRequest),
    GetScanResults { scan_id: String },
    ListJobs(JobsQuery),
    GetCacheStatus,
    InvalidateCache {
        fingerprint: Option<String>,
        repository_path: Option<PathBuf>,
    },
}

impl ToolRequest {
    /// Parse a raw call against the enumerated tool list.
    pub fn parse(call: &ToolCall) -> Result<Self, ToolError> {
        let args = &call.arguments;
        let bad = |detail: String| ToolError::BadArguments {
            tool: call.name.clone(),
            detail,
        };
        match call.name.as_str() {
            "scan_repository" => serde_json::from_value(args.clone())
                .map(ToolRequest::ScanRepository)
                .map_err(|e| bad(e.to_string())),
            "scan_multiple_repositories" => serde_json::from_value(args.clone())
                .map(ToolRequest::ScanMultipleRepositories)
                .map_err(|e| bad(e.to_string())),
            "get_scan_results" => {
                let scan_id = args
                    .get("scan_id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| bad("missing scan_id".to_string()))?;
                Ok(ToolRequest::GetScanResults {
                    scan_id: scan_id.to_string(),
                })
            }
            "list_jobs" => serde_json::from_value(args.clone())
                .map(ToolRequest::ListJobs)
                .map_err(|e| bad(e.to_string())),
            "get_cache_status" => Ok(ToolRequest::GetCacheStatus),
            "invalidate_cache" => {
                let fingerprint = args
                    .get("fingerprint")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                let repository_path = args
                    .get("repository_path")
                    .and_then(|v| v.as_str())
                    .map(PathBuf::from);
                if fingerprint.is_none() && repository_path.is_none() {
                    return Err(bad(
                        "either fingerprint or repository_path is required".to_string(),
                    ));
                }
                Ok(ToolRequest::InvalidateCache {
                    fingerprint,
                    repository_path,
                })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// The complete tool list with input schemas.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    let options_schema = json!({
        "type": "object",
        "properties": {
            "force_refresh": { "type": "boolean", "default": false },
            "include_tests": { "type": "boolean", "default": false },
            "max_depth": { "type": "integer", "minimum": 1 },
            "cache_enabled": { "type": "boolean", "default": true },
        },
        "additionalProperties": false,
    });
    vec![
        ToolDescriptor {
            name: "scan_repository",
            description: "Queue a duplicate-detection scan for one repository",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "repository_path": { "type": "string" },
                    "options": options_schema,
                },
                "required": ["repository_path"],
                "additionalProperties": false,
            }),
        },
        ToolDescriptor {
            name: "scan_multiple_repositories",
            description: "Queue one grouped scan across several repositories",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "repository_paths": { "type": "array", "items": { "type": "string" } },
                    "group_name": { "type": "string" },
                    "options": options_schema,
                },
                "required": ["repository_paths"],
                "additionalProperties": false,
            }),
        },
        ToolDescriptor {
            name: "get_scan_results",
            description: "Fetch the snapshot of a scan job by id",
            input_schema: json!({
                "type": "object",
                "properties": { "scan_id": { "type": "string" } },
                "required": ["scan_id"],
                "additionalProperties": false,
            }),
        },
        ToolDescriptor {
            name: "list_jobs",
            description: "List jobs, optionally filtered by status/type",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status": { "type": "string", "enum": ["queued", "running", "paused", "completed", "failed", "cancelled"] },
                    "type": { "type": "string" },
                    "limit": { "type": "integer", "minimum": 1 },
                },
                "additionalProperties": false,
            }),
        },
        ToolDescriptor {
            name: "get_cache_status",
            description: "Summarize the scan cache (entries, in-flight builds)",
            input_schema: json!({ "type": "object", "additionalProperties": false }),
        },
        ToolDescriptor {
            name: "invalidate_cache",
            description: "Invalidate cached scan artifacts by fingerprint or repository path",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "fingerprint": { "type": "string" },
                    "repository_path": { "type": "string" },
                },
                "additionalProperties": false,
            }),
        },
    ]
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
