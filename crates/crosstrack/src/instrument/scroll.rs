// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scroll-depth observations.
//!
//! Each call to `track_scroll` adds one registration. A registration fires
//! on the first intersection report that is intersecting with a ratio at or
//! above its threshold, and is removed in the same step, so it can never
//! fire twice however often the ratio oscillates afterwards. Re-arming
//! takes a fresh registration.

use super::host::ElementRef;

/// Selector observed when none is given.
pub const DEFAULT_SCROLL_SELECTOR: &str = "body";
/// Visible ratio required when none is given.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 0.5;

/// Clamps a threshold into `[0, 1]`. NaN is rejected.
pub fn normalize_threshold(threshold: f64) -> Option<f64> {
	if threshold.is_nan() {
		None
	} else {
		Some(threshold.clamp(0.0, 1.0))
	}
}

#[derive(Debug, Clone, PartialEq)]
struct ScrollRegistration {
	selector: String,
	element: ElementRef,
	threshold: f64,
}

/// A registration that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollHit {
	pub selector: String,
	pub ratio: f64,
}

/// Result of feeding one intersection report through the observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionOutcome {
	pub hits: Vec<ScrollHit>,
	/// No registration references the element any more; the host can
	/// stop observing it.
	pub release: bool,
}

/// Pending scroll registrations, in registration order.
#[derive(Debug, Default)]
pub struct ScrollObservations {
	registrations: Vec<ScrollRegistration>,
}

impl ScrollObservations {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a registration. `threshold` must already be normalized.
	pub fn register(&mut self, selector: impl Into<String>, element: ElementRef, threshold: f64) {
		self.registrations.push(ScrollRegistration {
			selector: selector.into(),
			element,
			threshold,
		});
	}

	pub fn on_intersection(
		&mut self,
		element: ElementRef,
		ratio: f64,
		is_intersecting: bool,
	) -> IntersectionOutcome {
		let mut outcome = IntersectionOutcome::default();
		let watched = self.is_watching(element);

		self.registrations.retain(|reg| {
			let fires = reg.element == element && is_intersecting && ratio >= reg.threshold;
			if fires {
				outcome.hits.push(ScrollHit {
					selector: reg.selector.clone(),
					ratio,
				});
			}
			!fires
		});

		outcome.release = watched && !self.is_watching(element);
		outcome
	}

	pub fn is_watching(&self, element: ElementRef) -> bool {
		self.registrations.iter().any(|reg| reg.element == element)
	}

	pub fn len(&self) -> usize {
		self.registrations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.registrations.is_empty()
	}
}
