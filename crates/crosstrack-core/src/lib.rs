// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the crosstrack client telemetry agent.
//!
//! This crate holds the event record shape sent over the wire and the
//! collaborator interfaces the delivery pipeline (`crosstrack`) depends on:
//!
//! - [`EventRecord`], [`Identity`], [`PageInfo`]: the enriched event
//! - [`EnvironmentCollector`]: opaque device/environment snapshots
//! - [`DurableStorage`]: read-or-create storage for the anonymous identity
//!
//! # Example
//!
//! ```
//! use crosstrack_core::{resolve_anonymous_id, EventRecord, Identity, MemoryStorage};
//!
//! let storage = MemoryStorage::new();
//! let anonymous_id = resolve_anonymous_id(&storage);
//!
//! let record = EventRecord::new("page_view", "shop")
//!     .with_identity(Identity::new(None, anonymous_id))
//!     .with_data(serde_json::json!({"section": "cart"}));
//!
//! assert_eq!(record.name(), "page_view");
//! ```

pub mod environment;
pub mod error;
pub mod event;
pub mod storage;

pub use environment::{
	default_user_agent, DeviceInfo, EnvironmentCollector, SystemEnvironment, SDK_NAME, SDK_VERSION,
};
pub use error::{EnvironmentError, StorageError};
pub use event::{builtin_events, empty_object, EventRecord, Identity, PageInfo};
pub use storage::{resolve_anonymous_id, DurableStorage, MemoryStorage, ANONYMOUS_ID_KEY};
