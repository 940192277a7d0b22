// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-embedded telemetry agent.
//!
//! A [`Tracker`] captures behavioral events inside a running client, enriches
//! them with identity, page, environment and context, buffers them, and
//! delivers them in batches to a collection endpoint. Every delivered batch
//! is also replayed to in-process [`ForwardingTarget`]s.
//!
//! # Quick Start
//!
//! ```ignore
//! use crosstrack::{Properties, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Tracker::builder()
//!         .endpoint("https://collect.example.com/v1/events")
//!         .project_id("shop")
//!         .init()
//!         .await?;
//!
//!     tracker.track("add_to_cart", Properties::new()
//!         .insert("sku", "A-100")
//!         .insert("quantity", 2)
//!     )?;
//!
//!     // Priority events skip the flush timer
//!     tracker.track("place_order", Properties::new().insert("order_id", "o-1"))?;
//!
//!     tracker.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Batching
//!
//! Records are queued and flushed when any of these happens:
//!
//! - the queue reaches `max_batch_size` (default 20)
//! - a priority event is tracked (default `place_order`)
//! - the flush timer fires, `flush_interval` (default 500 ms) after the
//!   first record queued since the last flush
//!
//! A flush sends at most `max_batch_size` records and re-arms the timer if
//! more remain.
//!
//! # Delivery
//!
//! A batch goes to the host's [`Beacon`] when there is one, otherwise to a
//! [`BatchSender`] (an HTTP POST by default) on a detached task. Delivery is
//! best effort: nothing is retried and failures are only logged.
//!
//! # Auto-instrumentation
//!
//! With a [`HostUi`] attached, the tracker can emit `auto_view`,
//! `auto_scroll` and `auto_click` events. Asynchronous UI activity is pushed
//! in through [`Tracker::handle_host_event`].

pub mod client;
pub mod config;
pub mod context;
pub mod enrich;
pub mod error;
pub mod forward;
pub mod instrument;
pub mod properties;
pub mod queue;
pub mod scheduler;
pub mod storage;
pub mod transport;

pub use client::{Tracker, TrackerBuilder, TRACK_LOG_TARGET};
pub use config::{load_layers, ConfigError, TrackerConfig, UserConfig};
pub use context::{ContextResolver, ResolveError, StaticContext};
pub use error::{Result, TrackerError};
pub use forward::{FanOutReport, FnForwarder, ForwardError, Forwarding, ForwardingTarget};
pub use instrument::{
	ElementRef, HostEvent, HostUi, InteractionTracker, Rect, DEFAULT_CLICK_SELECTOR,
	DEFAULT_SCROLL_SELECTOR, DEFAULT_SCROLL_THRESHOLD, DEFAULT_VIEW_SELECTOR,
};
pub use properties::Properties;
pub use storage::FileStorage;
pub use transport::{Beacon, BatchSender, DeliveryPath, HttpBatchSender};

pub use crosstrack_core::{
	builtin_events, DurableStorage, EnvironmentCollector, EventRecord, Identity, MemoryStorage,
	PageInfo, SystemEnvironment,
};
