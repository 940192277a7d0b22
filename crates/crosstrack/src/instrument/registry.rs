// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named interaction trackers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::client::Tracker;

/// A bespoke detector invoked by name through
/// [`Tracker::trigger_interaction`].
pub trait InteractionTracker: Send + Sync {
	fn on_trigger(&self, tracker: &Tracker, payload: Value);
}

impl<F> InteractionTracker for F
where
	F: Fn(&Tracker, Value) + Send + Sync,
{
	fn on_trigger(&self, tracker: &Tracker, payload: Value) {
		self(tracker, payload)
	}
}

/// Name to handler map. The last registration for a name wins.
#[derive(Default)]
pub struct InteractionRegistry {
	handlers: HashMap<String, Arc<dyn InteractionTracker>>,
}

impl InteractionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` under `name`. Empty names are ignored.
	pub fn register(&mut self, name: &str, handler: Arc<dyn InteractionTracker>) -> bool {
		if name.is_empty() {
			return false;
		}
		self.handlers.insert(name.to_string(), handler);
		true
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn InteractionTracker>> {
		self.handlers.get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.handlers.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}
