// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enrichment context shared by every record.

use std::sync::{PoisonError, RwLock};

use crosstrack_core::empty_object;
use serde_json::Value;
use tracing::{debug, warn};

/// Error type returned by context resolvers.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Produces the context blob once, during tracker init.
#[async_trait::async_trait]
pub trait ContextResolver: Send + Sync {
	async fn resolve(&self) -> Result<Value, ResolveError>;
}

/// A resolver that always yields the same value.
#[derive(Debug, Clone)]
pub struct StaticContext(pub Value);

#[async_trait::async_trait]
impl ContextResolver for StaticContext {
	async fn resolve(&self) -> Result<Value, ResolveError> {
		Ok(self.0.clone())
	}
}

/// Holds the context attached to every record. Starts as an empty object.
#[derive(Debug)]
pub struct ContextStore {
	value: RwLock<Value>,
}

impl ContextStore {
	pub fn new() -> Self {
		Self {
			value: RwLock::new(empty_object()),
		}
	}

	pub fn get(&self) -> Value {
		self.value
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn replace(&self, value: Value) {
		*self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
	}

	/// Runs `resolver` and stores its result. On failure the current value
	/// is kept and the error is logged when `debug` is set. Returns whether
	/// the store was updated.
	pub async fn resolve_with(&self, resolver: &dyn ContextResolver, debug: bool) -> bool {
		match resolver.resolve().await {
			Ok(value) => {
				debug!("Resolved tracker context");
				self.replace(value);
				true
			}
			Err(e) => {
				if debug {
					warn!(error = %e, "Context resolver failed");
				}
				false
			}
		}
	}
}

impl Default for ContextStore {
	fn default() -> Self {
		Self::new()
	}
}
