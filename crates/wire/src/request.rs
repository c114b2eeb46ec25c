// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-surface request bodies.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sweep_core::JobStatus;

/// Options accepted by scan creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
    pub force_refresh: bool,
    pub include_tests: bool,
    pub max_depth: Option<u32>,
    pub cache_enabled: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            include_tests: false,
            max_depth: None,
            cache_enabled: true,
        }
    }
}

/// `POST create-scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateScanRequest {
    pub repository_path: PathBuf,
    #[serde(default)]
    pub options: ScanOptions,
}

/// `POST create-multi-scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMultiScanRequest {
    pub repository_paths: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default)]
    pub options: ScanOptions,
}

/// `GET jobs?status=&type=&limit=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobsQuery {
    pub status: Option<JobStatus>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
