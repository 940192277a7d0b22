// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-backed durable storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crosstrack_core::{DurableStorage, StorageError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Stores entries as a JSON object in a single file.
///
/// A missing file reads as empty and is created on the first write. Writes
/// go to a temporary file in the same directory which is then renamed over
/// the target, so readers in other processes see either the old or the new
/// map. An unreadable or corrupt file reads as empty and is never
/// overwritten.
#[derive(Debug)]
pub struct FileStorage {
	path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			write_lock: Mutex::new(()),
		}
	}

	/// Storage at the platform data directory, e.g.
	/// `~/.local/share/crosstrack/storage.json` on Linux.
	pub fn at_default_location() -> Result<Self, StorageError> {
		default_storage_path()
			.map(Self::new)
			.ok_or_else(|| StorageError::Unavailable("no platform data directory".to_string()))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
			Err(e) => return Err(e.into()),
		};
		Ok(serde_json::from_str(&content)?)
	}

	fn parent_dir(&self) -> &Path {
		match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		}
	}
}

impl DurableStorage for FileStorage {
	fn get(&self, key: &str) -> Option<String> {
		match self.load() {
			Ok(mut entries) => entries.remove(key),
			Err(e) => {
				warn!(path = %self.path.display(), error = %e, "Failed to read storage file");
				None
			}
		}
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

		let mut entries = self.load()?;
		entries.insert(key.to_string(), value.to_string());

		let dir = self.parent_dir();
		fs::create_dir_all(dir)?;
		let mut file = NamedTempFile::new_in(dir)?;
		file.write_all(&serde_json::to_vec_pretty(&entries)?)?;
		file.as_file().sync_all()?;
		file.persist(&self.path).map_err(|e| e.error)?;

		debug!(path = %self.path.display(), key, "Persisted storage entry");
		Ok(())
	}
}

/// `{data_dir}/crosstrack/storage.json`
pub fn default_storage_path() -> Option<PathBuf> {
	dirs::data_dir().map(|dir| dir.join("crosstrack").join("storage.json"))
}
