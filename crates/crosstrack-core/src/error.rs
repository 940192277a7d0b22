// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the collaborator interfaces.

use thiserror::Error;

/// Errors raised by a [`DurableStorage`](crate::DurableStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("storage serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("storage unavailable: {0}")]
	Unavailable(String),
}

/// Errors raised while taking an environment snapshot.
#[derive(Debug, Error)]
pub enum EnvironmentError {
	#[error("environment field unavailable: {0}")]
	Unavailable(String),

	#[error("environment serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
