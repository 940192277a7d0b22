// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns a raw `(name, data)` pair into an [`EventRecord`].

use std::sync::Arc;

use crosstrack_core::{empty_object, EnvironmentCollector, EventRecord, Identity, PageInfo};
use serde_json::Value;
use tracing::warn;

use crate::instrument::HostUi;

pub struct Enricher {
	project_id: String,
	environment: Arc<dyn EnvironmentCollector>,
	host: Option<Arc<dyn HostUi>>,
	debug: bool,
}

impl Enricher {
	pub fn new(
		project_id: impl Into<String>,
		environment: Arc<dyn EnvironmentCollector>,
		host: Option<Arc<dyn HostUi>>,
		debug: bool,
	) -> Self {
		Self {
			project_id: project_id.into(),
			environment,
			host,
			debug,
		}
	}

	/// Builds a record stamped with the current time. A failing environment
	/// collector yields an empty `device` object instead of an error.
	pub fn enrich(&self, name: &str, data: Value, identity: Identity, context: Value) -> EventRecord {
		let environment = match self.environment.snapshot(&identity.anonymous_id) {
			Ok(snapshot) => snapshot,
			Err(e) => {
				if self.debug {
					warn!(error = %e, event = %name, "Environment snapshot failed");
				}
				empty_object()
			}
		};

		EventRecord::new(name, self.project_id.as_str())
			.with_identity(identity)
			.with_page(self.page())
			.with_environment(environment)
			.with_context(context)
			.with_data(data)
	}

	fn page(&self) -> PageInfo {
		self.host
			.as_ref()
			.map(|host| host.page_info())
			.unwrap_or_default()
	}
}
