// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The host UI seam.
//!
//! The tracker never walks a UI tree itself. It asks the host through
//! [`HostUi`] and is told about asynchronous UI activity through
//! [`HostEvent`]s pushed into [`Tracker::handle_host_event`].
//!
//! [`Tracker::handle_host_event`]: crate::Tracker::handle_host_event

use crosstrack_core::PageInfo;

/// Opaque handle to a host UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(pub u64);

/// An element's bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
	pub top: f64,
	pub bottom: f64,
	pub left: f64,
	pub right: f64,
}

impl Rect {
	pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
		Self {
			top,
			bottom,
			left,
			right,
		}
	}

	/// Whether the box lies entirely within a viewport of the given height.
	pub fn fits_vertically(&self, viewport_height: f64) -> bool {
		self.top >= 0.0 && self.bottom <= viewport_height
	}
}

/// Query and observation primitives supplied by the embedding UI.
pub trait HostUi: Send + Sync {
	/// Current location, used for the `page` field of every record.
	fn page_info(&self) -> PageInfo;

	/// First element matching `selector`.
	fn query_selector(&self, selector: &str) -> Option<ElementRef>;

	fn bounding_rect(&self, element: ElementRef) -> Option<Rect>;

	fn viewport_height(&self) -> f64;

	/// Closest ancestor-or-self of `element` matching `selector`.
	fn closest(&self, element: ElementRef, selector: &str) -> Option<ElementRef>;

	fn tag_name(&self, element: ElementRef) -> String;

	fn inner_text(&self, element: ElementRef) -> Option<String>;

	/// Starts reporting [`HostEvent::Intersection`] for `element` whenever
	/// its visible ratio crosses `threshold`.
	fn observe(&self, element: ElementRef, threshold: f64);

	fn unobserve(&self, element: ElementRef);
}

/// UI activity the host reports back to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
	/// An observed element's intersection with the viewport changed.
	Intersection {
		element: ElementRef,
		ratio: f64,
		is_intersecting: bool,
	},
	/// A click landed on `target`.
	Click { target: ElementRef },
	/// The host is going away (page unload, window close).
	Teardown,
}
