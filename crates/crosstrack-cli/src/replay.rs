// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON Lines event files.
//!
//! ```text
//! {"event": "page_view"}
//! {"event": "add_to_cart", "data": {"sku": "A-100"}}
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, PartialEq)]
pub struct ReplayEvent {
	pub event: String,
	#[serde(default)]
	pub data: Value,
}

/// Parses one event per non-blank line.
pub fn parse_events(content: &str) -> Result<Vec<ReplayEvent>> {
	content
		.lines()
		.enumerate()
		.filter(|(_, line)| !line.trim().is_empty())
		.map(|(idx, line)| {
			serde_json::from_str(line).with_context(|| format!("invalid event on line {}", idx + 1))
		})
		.collect()
}

pub fn read_events(path: &Path) -> Result<Vec<ReplayEvent>> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	parse_events(&content)
}
