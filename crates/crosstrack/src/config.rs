// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracker configuration.
//!
//! [`TrackerConfig`] is the resolved configuration the pipeline runs with.
//! [`UserConfig`] is a partial layer where every key is optional; layers are
//! merged shallowly over the defaults, so a key that is set replaces the
//! default wholesale and a key that is absent keeps it.
//!
//! Layers can come from a TOML file, `CROSSTRACK_*` environment variables
//! or code, in increasing precedence:
//!
//! ```toml
//! endpoint = "https://collect.example.com/v1/events"
//! project_id = "shop"
//! flush_interval_ms = 500
//! max_batch_size = 20
//! priority_events = ["place_order", "refund_issued"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use crosstrack_core::builtin_events;
use serde::Deserialize;
use tracing::{debug, trace};

/// Default flush interval.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);
/// Default maximum batch size.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;
/// Default time `shutdown` waits for in-flight deliveries.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const ENV_PREFIX: &str = "CROSSTRACK_";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Environment variable error
	#[error("Environment error: {0}")]
	Env(String),

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Resolved tracker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
	/// Collector URL. Not validated; a bad value fails at delivery time.
	pub endpoint: String,
	pub project_id: String,
	/// Enables diagnostic logging of swallowed failures.
	pub debug: bool,
	/// Emit `page_view` on init and flush on host teardown.
	pub auto_track_page_view: bool,
	pub user_id: Option<String>,
	pub flush_interval: Duration,
	pub max_batch_size: usize,
	/// Log every tracked record as pretty JSON.
	pub verbose_event_logging: bool,
	/// Event names that bypass the flush timer.
	pub priority_events: Vec<String>,
	pub shutdown_grace: Duration,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			endpoint: String::new(),
			project_id: String::new(),
			debug: false,
			auto_track_page_view: true,
			user_id: None,
			flush_interval: DEFAULT_FLUSH_INTERVAL,
			max_batch_size: DEFAULT_MAX_BATCH_SIZE,
			verbose_event_logging: false,
			priority_events: vec![builtin_events::PLACE_ORDER.to_string()],
			shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
		}
	}
}

impl TrackerConfig {
	/// Applies a layer over this configuration. Keys present in `layer`
	/// replace the current values; nothing is merged below the top level.
	pub fn apply(&mut self, layer: UserConfig) {
		let UserConfig {
			endpoint,
			project_id,
			debug,
			auto_track_page_view,
			user_id,
			flush_interval_ms,
			max_batch_size,
			verbose_event_logging,
			priority_events,
			shutdown_grace_ms,
		} = layer;

		if let Some(v) = endpoint {
			self.endpoint = v;
		}
		if let Some(v) = project_id {
			self.project_id = v;
		}
		if let Some(v) = debug {
			self.debug = v;
		}
		if let Some(v) = auto_track_page_view {
			self.auto_track_page_view = v;
		}
		if let Some(v) = user_id {
			self.user_id = Some(v);
		}
		if let Some(v) = flush_interval_ms {
			self.flush_interval = Duration::from_millis(v);
		}
		if let Some(v) = max_batch_size {
			self.max_batch_size = v;
		}
		if let Some(v) = verbose_event_logging {
			self.verbose_event_logging = v;
		}
		if let Some(v) = priority_events {
			self.priority_events = v;
		}
		if let Some(v) = shutdown_grace_ms {
			self.shutdown_grace = Duration::from_millis(v);
		}
	}

	/// Builds a configuration from the defaults and one layer.
	pub fn from_layer(layer: UserConfig) -> Result<Self, ConfigError> {
		let mut config = Self::default();
		config.apply(layer);
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the scheduler cannot run with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.flush_interval.is_zero() {
			return Err(ConfigError::invalid_value(
				"flush_interval_ms",
				"must be greater than zero",
			));
		}
		if self.max_batch_size == 0 {
			return Err(ConfigError::invalid_value(
				"max_batch_size",
				"must be greater than zero",
			));
		}
		Ok(())
	}

	pub fn is_priority_event(&self, event: &str) -> bool {
		self.priority_events.iter().any(|p| p == event)
	}
}

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub project_id: Option<String>,
	#[serde(default)]
	pub debug: Option<bool>,
	#[serde(default)]
	pub auto_track_page_view: Option<bool>,
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub flush_interval_ms: Option<u64>,
	#[serde(default)]
	pub max_batch_size: Option<usize>,
	#[serde(default)]
	pub verbose_event_logging: Option<bool>,
	#[serde(default)]
	pub priority_events: Option<Vec<String>>,
	#[serde(default)]
	pub shutdown_grace_ms: Option<u64>,
}

impl UserConfig {
	/// Parses a layer from TOML text.
	pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|e| ConfigError::TomlParse {
			path: origin.to_path_buf(),
			source: e,
		})
	}

	/// Loads a layer from a TOML file. A missing file yields an empty layer.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "config file not found, skipping");
			return Ok(Self::default());
		}

		debug!(path = %path.display(), "loading config file");
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content, path)
	}

	/// Loads a layer from `CROSSTRACK_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_vars(std::env::vars())
	}

	/// Loads a layer from `(name, value)` pairs; names without the
	/// `CROSSTRACK_` prefix and empty values are ignored.
	pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut layer = Self::default();

		for (key, value) in vars {
			let Some(name) = key.strip_prefix(ENV_PREFIX) else {
				continue;
			};
			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match name {
				"ENDPOINT" => layer.endpoint = Some(value),
				"PROJECT_ID" => layer.project_id = Some(value),
				"DEBUG" => layer.debug = Some(parse_bool(&key, &value)?),
				"AUTO_TRACK_PAGE_VIEW" => layer.auto_track_page_view = Some(parse_bool(&key, &value)?),
				"USER_ID" => layer.user_id = Some(value),
				"FLUSH_INTERVAL_MS" => layer.flush_interval_ms = Some(parse_number(&key, &value)?),
				"MAX_BATCH_SIZE" => layer.max_batch_size = Some(parse_number(&key, &value)?),
				"VERBOSE_EVENT_LOGGING" => {
					layer.verbose_event_logging = Some(parse_bool(&key, &value)?)
				}
				"PRIORITY_EVENTS" => {
					layer.priority_events = Some(
						value
							.split(',')
							.map(str::trim)
							.filter(|s| !s.is_empty())
							.map(str::to_string)
							.collect(),
					)
				}
				"SHUTDOWN_GRACE_MS" => layer.shutdown_grace_ms = Some(parse_number(&key, &value)?),
				_ => trace!(key = %key, "ignoring unknown env var"),
			}
		}

		Ok(layer)
	}

	/// Overlays `higher` on this layer; keys set in `higher` win.
	pub fn overlay(self, higher: UserConfig) -> Self {
		Self {
			endpoint: higher.endpoint.or(self.endpoint),
			project_id: higher.project_id.or(self.project_id),
			debug: higher.debug.or(self.debug),
			auto_track_page_view: higher.auto_track_page_view.or(self.auto_track_page_view),
			user_id: higher.user_id.or(self.user_id),
			flush_interval_ms: higher.flush_interval_ms.or(self.flush_interval_ms),
			max_batch_size: higher.max_batch_size.or(self.max_batch_size),
			verbose_event_logging: higher.verbose_event_logging.or(self.verbose_event_logging),
			priority_events: higher.priority_events.or(self.priority_events),
			shutdown_grace_ms: higher.shutdown_grace_ms.or(self.shutdown_grace_ms),
		}
	}
}

/// Default config file: `$XDG_CONFIG_HOME/crosstrack/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("crosstrack").join("config.toml"))
}

/// Loads the file layer then the environment layer.
pub fn load_layers(path: Option<&Path>) -> Result<UserConfig, ConfigError> {
	let file = match path.map(Path::to_path_buf).or_else(default_config_path) {
		Some(path) => UserConfig::from_file(&path)?,
		None => UserConfig::default(),
	};
	Ok(file.overlay(UserConfig::from_env()?))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::Env(format!("{key}: expected a boolean, got {value:?}"))),
	}
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
	value
		.parse()
		.map_err(|_| ConfigError::Env(format!("{key}: expected a number, got {value:?}")))
}
