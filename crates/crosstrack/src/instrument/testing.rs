// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory host UI for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crosstrack_core::PageInfo;

use super::host::{ElementRef, HostUi, Rect};

struct FakeElement {
	selectors: Vec<String>,
	parent: Option<ElementRef>,
	tag: String,
	text: Option<String>,
	rect: Rect,
}

pub struct FakeHost {
	viewport_height: f64,
	elements: Mutex<BTreeMap<ElementRef, FakeElement>>,
	pub observed: Mutex<Vec<(ElementRef, f64)>>,
	pub unobserved: Mutex<Vec<ElementRef>>,
}

impl FakeHost {
	pub fn new(viewport_height: f64) -> Self {
		Self {
			viewport_height,
			elements: Mutex::new(BTreeMap::new()),
			observed: Mutex::new(Vec::new()),
			unobserved: Mutex::new(Vec::new()),
		}
	}

	pub fn add(&self, selector: &str, tag: &str, rect: Rect) -> ElementRef {
		self.add_child(None, &[selector], tag, None, rect)
	}

	pub fn add_child(
		&self,
		parent: Option<ElementRef>,
		selectors: &[&str],
		tag: &str,
		text: Option<&str>,
		rect: Rect,
	) -> ElementRef {
		let mut elements = self.elements.lock().unwrap();
		let id = ElementRef(elements.len() as u64 + 1);
		elements.insert(
			id,
			FakeElement {
				selectors: selectors.iter().map(|s| s.to_string()).collect(),
				parent,
				tag: tag.to_string(),
				text: text.map(str::to_string),
				rect,
			},
		);
		id
	}
}

impl HostUi for FakeHost {
	fn page_info(&self) -> PageInfo {
		PageInfo::new("app://test/home", "")
	}

	fn query_selector(&self, selector: &str) -> Option<ElementRef> {
		self.elements
			.lock()
			.unwrap()
			.iter()
			.find(|(_, el)| el.selectors.iter().any(|s| s == selector))
			.map(|(id, _)| *id)
	}

	fn bounding_rect(&self, element: ElementRef) -> Option<Rect> {
		self.elements.lock().unwrap().get(&element).map(|el| el.rect)
	}

	fn viewport_height(&self) -> f64 {
		self.viewport_height
	}

	fn closest(&self, element: ElementRef, selector: &str) -> Option<ElementRef> {
		let elements = self.elements.lock().unwrap();
		let mut current = Some(element);
		while let Some(id) = current {
			let el = elements.get(&id)?;
			if el.selectors.iter().any(|s| s == selector) {
				return Some(id);
			}
			current = el.parent;
		}
		None
	}

	fn tag_name(&self, element: ElementRef) -> String {
		self.elements
			.lock()
			.unwrap()
			.get(&element)
			.map(|el| el.tag.clone())
			.unwrap_or_default()
	}

	fn inner_text(&self, element: ElementRef) -> Option<String> {
		self.elements
			.lock()
			.unwrap()
			.get(&element)
			.and_then(|el| el.text.clone())
	}

	fn observe(&self, element: ElementRef, threshold: f64) {
		self.observed.lock().unwrap().push((element, threshold));
	}

	fn unobserve(&self, element: ElementRef) {
		self.unobserved.lock().unwrap().push(element);
	}
}
