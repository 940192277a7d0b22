// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event records: the unit of telemetry queued for delivery.
//!
//! A record is assembled once by the enricher and then only read. The
//! builder methods consume the record and hand back a new one, so a record
//! that is already queued can never be changed in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authenticated and anonymous identity attached to every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	#[serde(rename = "uid")]
	pub user_id: Option<String>,
	#[serde(rename = "anonymousId")]
	pub anonymous_id: String,
}

impl Identity {
	pub fn new(user_id: Option<String>, anonymous_id: impl Into<String>) -> Self {
		Self {
			user_id,
			anonymous_id: anonymous_id.into(),
		}
	}
}

/// Location of the page (or screen) the event was raised on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
	pub url: String,
	pub referrer: String,
}

impl PageInfo {
	pub fn new(url: impl Into<String>, referrer: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			referrer: referrer.into(),
		}
	}
}

/// A fully enriched telemetry event.
///
/// Serialized with the collector's wire names:
///
/// ```json
/// {
///   "event": "page_view",
///   "ts": "2025-01-01T00:00:00.000Z",
///   "projectId": "shop",
///   "user": { "uid": null, "anonymousId": "..." },
///   "page": { "url": "...", "referrer": "..." },
///   "device": { ... },
///   "context": { ... },
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
	#[serde(rename = "event")]
	name: String,
	#[serde(rename = "ts", with = "iso_millis")]
	timestamp: DateTime<Utc>,
	#[serde(rename = "projectId")]
	project_id: String,
	#[serde(rename = "user")]
	identity: Identity,
	page: PageInfo,
	#[serde(rename = "device")]
	environment: Value,
	context: Value,
	data: Value,
}

impl EventRecord {
	/// Creates a record stamped with the current time and empty enrichment.
	pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			timestamp: Utc::now(),
			project_id: project_id.into(),
			identity: Identity::default(),
			page: PageInfo::default(),
			environment: empty_object(),
			context: empty_object(),
			data: empty_object(),
		}
	}

	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = timestamp;
		self
	}

	pub fn with_identity(mut self, identity: Identity) -> Self {
		self.identity = identity;
		self
	}

	pub fn with_page(mut self, page: PageInfo) -> Self {
		self.page = page;
		self
	}

	/// Sets the opaque environment snapshot (serialized as `device`).
	pub fn with_environment(mut self, environment: Value) -> Self {
		self.environment = environment;
		self
	}

	pub fn with_context(mut self, context: Value) -> Self {
		self.context = context;
		self
	}

	pub fn with_data(mut self, data: Value) -> Self {
		self.data = data;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn timestamp(&self) -> DateTime<Utc> {
		self.timestamp
	}

	/// Timestamp in the wire format, e.g. `2025-01-01T00:00:00.000Z`.
	pub fn timestamp_iso(&self) -> String {
		iso_millis::format(&self.timestamp)
	}

	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	pub fn page(&self) -> &PageInfo {
		&self.page
	}

	pub fn environment(&self) -> &Value {
		&self.environment
	}

	pub fn context(&self) -> &Value {
		&self.context
	}

	pub fn data(&self) -> &Value {
		&self.data
	}
}

/// Returns an empty JSON object, the neutral value for enrichment blobs.
pub fn empty_object() -> Value {
	Value::Object(serde_json::Map::new())
}

/// Event names raised by the agent itself.
pub mod builtin_events {
	/// Emitted once on init when automatic page views are enabled.
	pub const PAGE_VIEW: &str = "page_view";
	/// Emitted by view detection.
	pub const AUTO_VIEW: &str = "auto_view";
	/// Emitted by scroll/visibility-ratio detection.
	pub const AUTO_SCROLL: &str = "auto_scroll";
	/// Emitted by click delegation.
	pub const AUTO_CLICK: &str = "auto_click";
	/// Default priority event; forces an immediate flush.
	pub const PLACE_ORDER: &str = "place_order";
}

mod iso_millis {
	use chrono::{DateTime, SecondsFormat, Utc};
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn format(ts: &DateTime<Utc>) -> String {
		ts.to_rfc3339_opts(SecondsFormat::Millis, true)
	}

	pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&format(ts))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		DateTime::parse_from_rfc3339(&raw)
			.map(|ts| ts.with_timezone(&Utc))
			.map_err(serde::de::Error::custom)
	}
}
