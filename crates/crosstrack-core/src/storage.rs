// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable key/value storage and the anonymous identity kept in it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;

/// Storage key holding the anonymous identifier.
pub const ANONYMOUS_ID_KEY: &str = "_cross_anonymous_id";

/// A durable string store scoped to one device or installation.
pub trait DurableStorage: Send + Sync {
	/// Reads a value, `None` when the key has never been written.
	fn get(&self, key: &str) -> Option<String>;

	/// Writes a value, replacing any previous one.
	fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Identities do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

impl DurableStorage for MemoryStorage {
	fn get(&self, key: &str) -> Option<String> {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Returns the stored anonymous identifier, creating and persisting one
/// the first time.
///
/// An existing non-empty value is never replaced. If persisting a fresh
/// identifier fails, the identifier is still returned for this process
/// and the failure is logged.
pub fn resolve_anonymous_id(storage: &dyn DurableStorage) -> String {
	if let Some(existing) = storage.get(ANONYMOUS_ID_KEY).filter(|id| !id.is_empty()) {
		debug!(anonymous_id = %existing, "Reusing stored anonymous id");
		return existing;
	}

	let fresh = Uuid::new_v4().to_string();
	if let Err(e) = storage.set(ANONYMOUS_ID_KEY, &fresh) {
		warn!(error = %e, "Failed to persist anonymous id");
	}
	debug!(anonymous_id = %fresh, "Created anonymous id");
	fresh
}
