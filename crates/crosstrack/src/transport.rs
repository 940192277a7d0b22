// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch delivery to the collector.
//!
//! A batch is serialized once into a JSON array and handed to one of two
//! primitives:
//!
//! - a host-provided [`Beacon`]: non-blocking, fire-and-forget, safe to use
//!   while the host is tearing down;
//! - otherwise a [`BatchSender`] (by default [`HttpBatchSender`], an HTTP
//!   POST with `Content-Type: application/json`) running on a detached task.
//!
//! Neither path is awaited or retried. A batch counts as delivered once it
//! is handed over; failures of the request path are only logged.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use crosstrack_core::{default_user_agent, EventRecord};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::error::{Result, TrackerError};

/// A fire-and-forget send primitive supplied by the host, in the manner of
/// a browser's `navigator.sendBeacon`.
pub trait Beacon: Send + Sync {
	/// Queues `payload` for delivery to `url` without blocking. Returns
	/// whether the host accepted it.
	fn send_beacon(&self, url: &str, payload: Bytes) -> bool;
}

/// Request/response delivery of a serialized batch.
#[async_trait::async_trait]
pub trait BatchSender: Send + Sync {
	/// Sends a JSON-encoded batch to `endpoint`.
	async fn send_batch(&self, endpoint: &str, payload: Bytes) -> Result<()>;
}

/// HTTP batch sender implementation.
pub struct HttpBatchSender {
	http_client: Client,
}

impl HttpBatchSender {
	/// Creates a sender with the SDK user agent and no request timeout.
	pub fn new() -> Result<Self> {
		let http_client = Client::builder()
			.user_agent(default_user_agent())
			.build()
			.map_err(TrackerError::RequestFailed)?;
		Ok(Self { http_client })
	}

	/// Creates a sender on top of an existing client.
	pub fn with_client(http_client: Client) -> Self {
		Self { http_client }
	}
}

#[async_trait::async_trait]
impl BatchSender for HttpBatchSender {
	async fn send_batch(&self, endpoint: &str, payload: Bytes) -> Result<()> {
		debug!(endpoint = %endpoint, bytes = payload.len(), "Posting event batch");

		let response = self
			.http_client
			.post(endpoint)
			.header(CONTENT_TYPE, "application/json")
			.body(payload)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(TrackerError::ServerError {
				status: response.status().as_u16(),
				message: response.text().await.unwrap_or_default(),
			});
		}

		Ok(())
	}
}

/// Which primitive a batch was handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
	Beacon,
	Request,
}

/// Serializes batches and dispatches them on the preferred path.
pub struct Transport {
	endpoint: String,
	beacon: Option<Arc<dyn Beacon>>,
	sender: Arc<dyn BatchSender>,
	runtime: Handle,
	in_flight: TaskTracker,
}

impl Transport {
	pub fn new(
		endpoint: impl Into<String>,
		beacon: Option<Arc<dyn Beacon>>,
		sender: Arc<dyn BatchSender>,
		runtime: Handle,
	) -> Self {
		Self {
			endpoint: endpoint.into(),
			beacon,
			sender,
			runtime,
			in_flight: TaskTracker::new(),
		}
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// Hands `batch` to the beacon if the host has one, otherwise to a
	/// detached request task. Only serialization can fail here.
	pub fn send(&self, batch: &[EventRecord]) -> Result<DeliveryPath> {
		let payload = Bytes::from(serde_json::to_vec(batch)?);

		if let Some(beacon) = &self.beacon {
			if !beacon.send_beacon(&self.endpoint, payload) {
				debug!(count = batch.len(), "Beacon did not accept event batch");
			}
			return Ok(DeliveryPath::Beacon);
		}

		let sender = Arc::clone(&self.sender);
		let endpoint = self.endpoint.clone();
		let count = batch.len();
		self.in_flight.spawn_on(
			async move {
				if let Err(e) = sender.send_batch(&endpoint, payload).await {
					debug!(error = %e, count, "Event batch delivery failed");
				}
			},
			&self.runtime,
		);

		Ok(DeliveryPath::Request)
	}

	/// Number of request-path deliveries still running.
	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	/// Waits up to `grace` for running request-path deliveries. Returns
	/// `true` if all of them finished in time.
	pub async fn drain_in_flight(&self, grace: Duration) -> bool {
		self.in_flight.close();
		tokio::time::timeout(grace, self.in_flight.wait())
			.await
			.is_ok()
	}
}
