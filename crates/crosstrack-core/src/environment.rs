// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment snapshots attached to every record.
//!
//! The pipeline treats a snapshot as an opaque JSON blob. [`SystemEnvironment`]
//! is the default collector for native hosts; embedders with richer device
//! information (viewport, paint timings, connection type) supply their own
//! [`EnvironmentCollector`].

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvironmentError;

/// SDK name reported in the default user agent.
pub const SDK_NAME: &str = "crosstrack";
/// SDK version reported in the default user agent.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supplies the environment snapshot for a record.
pub trait EnvironmentCollector: Send + Sync {
	fn snapshot(&self, anonymous_id: &str) -> Result<Value, EnvironmentError>;
}

/// Device fields gathered by [`SystemEnvironment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
	pub uuid: String,
	/// Milliseconds since the Unix epoch.
	pub timestamp: i64,
	pub timezone: String,
	pub lang: String,
	pub ua: String,
	/// `{os}-{arch}`, e.g. `linux-x86_64`.
	pub platform: String,
	pub hardware_concurrency: Option<usize>,
}

/// Collects device information from the running process.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
	user_agent: String,
}

impl SystemEnvironment {
	pub fn new() -> Self {
		Self {
			user_agent: default_user_agent(),
		}
	}

	/// Overrides the reported user agent, e.g. with the embedding app's name.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	pub fn device_info(&self, anonymous_id: &str) -> DeviceInfo {
		DeviceInfo {
			uuid: anonymous_id.to_string(),
			timestamp: Utc::now().timestamp_millis(),
			timezone: timezone(),
			lang: language(),
			ua: self.user_agent.clone(),
			platform: platform(),
			hardware_concurrency: std::thread::available_parallelism().ok().map(|n| n.get()),
		}
	}
}

impl Default for SystemEnvironment {
	fn default() -> Self {
		Self::new()
	}
}

impl EnvironmentCollector for SystemEnvironment {
	fn snapshot(&self, anonymous_id: &str) -> Result<Value, EnvironmentError> {
		Ok(serde_json::to_value(self.device_info(anonymous_id))?)
	}
}

/// `crosstrack/{version} ({os}-{arch})`
pub fn default_user_agent() -> String {
	format!("{SDK_NAME}/{SDK_VERSION} ({})", platform())
}

fn platform() -> String {
	format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

fn timezone() -> String {
	match std::env::var("TZ") {
		Ok(tz) if !tz.trim().is_empty() => tz,
		_ => Local::now().offset().to_string(),
	}
}

fn language() -> String {
	["LC_ALL", "LC_MESSAGES", "LANG"]
		.iter()
		.filter_map(|key| std::env::var(key).ok())
		.find(|value| !value.is_empty() && value != "C" && value != "POSIX")
		.map(|value| normalize_locale(&value))
		.unwrap_or_else(|| "unknown".to_string())
}

/// `en_US.UTF-8` -> `en-US`
fn normalize_locale(raw: &str) -> String {
	let base = raw.split(['.', '@']).next().unwrap_or(raw);
	base.replace('_', "-")
}
