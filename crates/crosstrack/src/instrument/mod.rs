// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Auto-instrumentation of the host UI.
//!
//! - [`view`]: point-in-time "fully in viewport" check (`auto_view`)
//! - [`scroll`]: first-crossing visible-ratio observations (`auto_scroll`)
//! - [`click`]: delegated click matching (`auto_click`)
//! - [`registry`]: named, caller-supplied interaction trackers
//!
//! The submodules hold state and matching logic only. Emitting events is
//! done by [`Tracker`](crate::Tracker), which owns the host handle.

pub mod click;
pub mod host;
pub mod registry;
pub mod scroll;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use click::{ClickDelegation, ClickHit, DEFAULT_CLICK_SELECTOR, MAX_CLICK_TEXT_CHARS};
pub use host::{ElementRef, HostEvent, HostUi, Rect};
pub use registry::{InteractionRegistry, InteractionTracker};
pub use scroll::{
	IntersectionOutcome, ScrollHit, ScrollObservations, DEFAULT_SCROLL_SELECTOR,
	DEFAULT_SCROLL_THRESHOLD,
};
pub use view::DEFAULT_VIEW_SELECTOR;
