// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use crosstrack::{
	Beacon, ElementRef, HostUi, MemoryStorage, PageInfo, Rect, Tracker, TrackerBuilder,
};
use serde_json::Value;

pub const ENDPOINT: &str = "https://collect.test/v1/events";

/// Beacon that decodes and keeps every batch it is handed.
#[derive(Default)]
pub struct RecordingBeacon {
	batches: Mutex<Vec<Vec<Value>>>,
}

impl RecordingBeacon {
	pub fn batches(&self) -> Vec<Vec<Value>> {
		self.batches.lock().unwrap().clone()
	}

	pub fn event_names(&self) -> Vec<String> {
		self.batches()
			.iter()
			.flatten()
			.map(|record| record["event"].as_str().unwrap().to_string())
			.collect()
	}
}

impl Beacon for RecordingBeacon {
	fn send_beacon(&self, url: &str, payload: Bytes) -> bool {
		assert_eq!(url, ENDPOINT);
		let batch: Vec<Value> = serde_json::from_slice(&payload).unwrap();
		self.batches.lock().unwrap().push(batch);
		true
	}
}

struct Element {
	selectors: Vec<String>,
	parent: Option<ElementRef>,
	tag: String,
	text: Option<String>,
	rect: Rect,
}

/// A flat, in-memory UI tree.
pub struct FakeHost {
	viewport_height: f64,
	elements: Mutex<BTreeMap<ElementRef, Element>>,
	pub observed: Mutex<Vec<(ElementRef, f64)>>,
	pub unobserved: Mutex<Vec<ElementRef>>,
}

impl FakeHost {
	pub fn new(viewport_height: f64) -> Arc<Self> {
		Arc::new(Self {
			viewport_height,
			elements: Mutex::new(BTreeMap::new()),
			observed: Mutex::new(Vec::new()),
			unobserved: Mutex::new(Vec::new()),
		})
	}

	pub fn element(
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
			Element {
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
		PageInfo::new("app://shop/cart", "app://shop/home")
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

/// Builder with in-memory storage, no automatic page view and a long
/// flush interval.
pub fn builder(beacon: &Arc<RecordingBeacon>) -> TrackerBuilder {
	Tracker::builder()
		.endpoint(ENDPOINT)
		.project_id("shop")
		.auto_track_page_view(false)
		.flush_interval(Duration::from_secs(60))
		.storage(Arc::new(MemoryStorage::new()))
		.beacon(beacon.clone())
}
