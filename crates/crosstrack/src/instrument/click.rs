// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delegated click tracking.
//!
//! One delegation per selector. A click is matched against every wired
//! selector through [`HostUi::closest`]; each match produces one hit.

use super::host::{ElementRef, HostUi};

/// Selector wired when none is given.
pub const DEFAULT_CLICK_SELECTOR: &str = "[data-track-click]";
/// Longest text snippet attached to an `auto_click` event, in characters.
pub const MAX_CLICK_TEXT_CHARS: usize = 100;

/// A click that matched a wired selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickHit {
	pub selector: String,
	pub tag: String,
	pub text: Option<String>,
}

#[derive(Debug, Default)]
pub struct ClickDelegation {
	selectors: Vec<String>,
}

impl ClickDelegation {
	pub fn new() -> Self {
		Self::default()
	}

	/// Wires `selector`. Returns `false` if it was already wired.
	pub fn add(&mut self, selector: &str) -> bool {
		if self.selectors.iter().any(|s| s == selector) {
			return false;
		}
		self.selectors.push(selector.to_string());
		true
	}

	pub fn len(&self) -> usize {
		self.selectors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.selectors.is_empty()
	}

	pub fn resolve(&self, host: &dyn HostUi, target: ElementRef) -> Vec<ClickHit> {
		self.selectors
			.iter()
			.filter_map(|selector| {
				let matched = host.closest(target, selector)?;
				Some(ClickHit {
					selector: selector.clone(),
					tag: host.tag_name(matched),
					text: host
						.inner_text(matched)
						.map(|text| truncate_chars(&text, MAX_CLICK_TEXT_CHARS)),
				})
			})
			.collect()
	}
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
	match text.char_indices().nth(max) {
		Some((idx, _)) => text[..idx].to_string(),
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::instrument::host::Rect;
	use crate::instrument::testing::FakeHost;
	use proptest::prelude::*;

	#[test]
	fn add_is_idempotent_per_selector() {
		let mut clicks = ClickDelegation::new();
		assert!(clicks.add(DEFAULT_CLICK_SELECTOR));
		assert!(!clicks.add(DEFAULT_CLICK_SELECTOR));
		assert!(clicks.add(".cta"));
		assert_eq!(clicks.len(), 2);
	}

	#[test]
	fn click_on_descendant_matches_ancestor() {
		let host = FakeHost::new(800.0);
		let button = host.add_child(
			None,
			&["[data-track-click]"],
			"BUTTON",
			Some("Add to cart"),
			Rect::default(),
		);
		let icon = host.add_child(Some(button), &["svg"], "SVG", None, Rect::default());

		let mut clicks = ClickDelegation::new();
		clicks.add(DEFAULT_CLICK_SELECTOR);

		let hits = clicks.resolve(&host, icon);
		assert_eq!(
			hits,
			vec![ClickHit {
				selector: "[data-track-click]".to_string(),
				tag: "BUTTON".to_string(),
				text: Some("Add to cart".to_string()),
			}]
		);
	}

	#[test]
	fn click_outside_selector_is_ignored() {
		let host = FakeHost::new(800.0);
		let para = host.add_child(None, &["p"], "P", Some("hello"), Rect::default());

		let mut clicks = ClickDelegation::new();
		clicks.add(DEFAULT_CLICK_SELECTOR);
		assert!(clicks.resolve(&host, para).is_empty());
	}

	#[test]
	fn long_text_is_truncated() {
		let host = FakeHost::new(800.0);
		let long = "x".repeat(250);
		let link = host.add_child(None, &["a.promo"], "A", Some(&long), Rect::default());

		let mut clicks = ClickDelegation::new();
		clicks.add("a.promo");

		let hits = clicks.resolve(&host, link);
		assert_eq!(hits[0].text.as_deref().map(str::len), Some(MAX_CLICK_TEXT_CHARS));
	}

	#[test]
	fn truncate_respects_char_boundaries() {
		assert_eq!(truncate_chars("héllo", 2), "hé");
		assert_eq!(truncate_chars("short", 100), "short");
	}

	proptest! {
		#[test]
		fn truncation_is_a_bounded_prefix(text in ".{0,300}", max in 0usize..150) {
			let out = truncate_chars(&text, max);
			prop_assert!(out.chars().count() <= max);
			prop_assert!(text.starts_with(&out));
		}
	}
}
