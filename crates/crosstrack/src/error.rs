// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the tracker.

use thiserror::Error;

use crate::config::ConfigError;

/// Tracker errors.
///
/// Only [`TrackerError::ClientShutdown`] and [`TrackerError::Config`] ever
/// reach a caller of the tracking surface; the delivery variants are
/// produced by [`BatchSender`](crate::transport::BatchSender)
/// implementations and only logged by the pipeline.
#[derive(Debug, Error)]
pub enum TrackerError {
	/// Tracker has been shut down.
	#[error("tracker has been shut down")]
	ClientShutdown,

	/// Configuration was rejected.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collector answered with a non-success status.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// A batch could not be serialized.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Durable storage failed.
	#[error("storage error: {0}")]
	Storage(#[from] crosstrack_core::StorageError),
}

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
