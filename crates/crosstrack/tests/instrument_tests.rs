// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for auto-instrumentation driven by a host UI.

mod common;

use std::sync::Arc;

use common::{builder, FakeHost, RecordingBeacon};
use crosstrack::{
	HostEvent, Rect, Tracker, DEFAULT_CLICK_SELECTOR, DEFAULT_SCROLL_SELECTOR,
	DEFAULT_SCROLL_THRESHOLD, DEFAULT_VIEW_SELECTOR,
};
use serde_json::{json, Value};

fn intersection(element: crosstrack::ElementRef, ratio: f64) -> HostEvent {
	HostEvent::Intersection {
		element,
		ratio,
		is_intersecting: ratio > 0.0,
	}
}

#[tokio::test]
async fn scroll_fires_once_despite_oscillation() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let hero = host.element(None, &["#hero"], "SECTION", None, Rect::default());
	let tracker = builder(&beacon).host(host.clone()).init().await.unwrap();

	assert!(tracker.track_scroll("#hero", 0.5).unwrap());

	for ratio in [0.2, 0.6, 0.1, 0.9, 0.0, 1.0, 0.7] {
		tracker.handle_host_event(intersection(hero, ratio));
	}
	tracker.flush();

	let batches = beacon.batches();
	let scrolls: Vec<&Value> = batches
		.iter()
		.flatten()
		.filter(|r| r["event"] == "auto_scroll")
		.collect();
	assert_eq!(scrolls.len(), 1);
	assert_eq!(scrolls[0]["data"], json!({"selector": "#hero", "ratio": 0.6}));
	assert_eq!(*host.unobserved.lock().unwrap(), vec![hero]);
}

#[tokio::test]
async fn scroll_can_be_rearmed_with_a_new_registration() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let hero = host.element(None, &["#hero"], "SECTION", None, Rect::default());
	let tracker = builder(&beacon).host(host.clone()).init().await.unwrap();

	tracker.track_scroll("#hero", 0.5).unwrap();
	tracker.handle_host_event(intersection(hero, 0.8));
	tracker.track_scroll("#hero", 0.5).unwrap();
	tracker.handle_host_event(intersection(hero, 0.8));
	tracker.flush();

	assert_eq!(beacon.event_names(), vec!["auto_scroll", "auto_scroll"]);
	assert_eq!(host.observed.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn scroll_defaults_observe_body_at_half() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let body = host.element(None, &["body"], "BODY", None, Rect::default());
	let tracker = builder(&beacon).host(host.clone()).init().await.unwrap();

	assert!(tracker
		.track_scroll(DEFAULT_SCROLL_SELECTOR, DEFAULT_SCROLL_THRESHOLD)
		.unwrap());
	assert_eq!(*host.observed.lock().unwrap(), vec![(body, 0.5)]);
}

#[tokio::test]
async fn scroll_on_missing_element_registers_nothing() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let tracker = builder(&beacon).host(host.clone()).init().await.unwrap();

	assert!(!tracker.track_scroll("#missing", 0.5).unwrap());
	assert!(host.observed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn view_checks_body_by_default() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	host.element(None, &["body"], "BODY", None, Rect::new(0.0, 800.0, 0.0, 1280.0));
	let tracker = builder(&beacon).host(host).init().await.unwrap();

	assert!(tracker.track_view(DEFAULT_VIEW_SELECTOR).unwrap());
	tracker.flush();

	let record = &beacon.batches()[0][0];
	assert_eq!(record["event"], "auto_view");
	assert_eq!(record["data"]["selector"], "body");
	assert_eq!(record["page"]["url"], "app://shop/cart");
	assert_eq!(record["page"]["referrer"], "app://shop/home");
}

#[tokio::test]
async fn delegated_click_matches_closest_ancestor() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let long_label = "Add to cart ".repeat(20);
	let button = host.element(
		None,
		&[DEFAULT_CLICK_SELECTOR],
		"BUTTON",
		Some(&long_label),
		Rect::default(),
	);
	let icon = host.element(Some(button), &["svg"], "SVG", None, Rect::default());
	let outside = host.element(None, &["p"], "P", Some("terms"), Rect::default());
	let tracker = builder(&beacon).host(host).init().await.unwrap();

	assert!(tracker.track_click(DEFAULT_CLICK_SELECTOR).unwrap());
	tracker.handle_host_event(HostEvent::Click { target: icon });
	tracker.handle_host_event(HostEvent::Click { target: outside });
	tracker.flush();

	let batch = &beacon.batches()[0];
	assert_eq!(batch.len(), 1);
	let data = &batch[0]["data"];
	assert_eq!(data["selector"], DEFAULT_CLICK_SELECTOR);
	assert_eq!(data["tag"], "BUTTON");
	assert_eq!(data["text"].as_str().unwrap().chars().count(), 100);
}

#[tokio::test]
async fn repeated_click_wiring_emits_once_per_click() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let link = host.element(None, &["a.promo"], "A", Some("Sale"), Rect::default());
	let tracker = builder(&beacon).host(host).init().await.unwrap();

	tracker.track_click("a.promo").unwrap();
	tracker.track_click("a.promo").unwrap();
	tracker.track_click("a.promo").unwrap();
	tracker.handle_host_event(HostEvent::Click { target: link });
	tracker.flush();

	assert_eq!(beacon.event_names(), vec!["auto_click"]);
}

#[tokio::test]
async fn instrumentation_without_host_is_a_no_op() {
	let beacon = Arc::new(RecordingBeacon::default());
	let tracker = builder(&beacon).init().await.unwrap();

	assert!(!tracker.track_view(DEFAULT_VIEW_SELECTOR).unwrap());
	assert!(!tracker.track_scroll(DEFAULT_SCROLL_SELECTOR, 0.5).unwrap());
	assert!(!tracker.track_click(DEFAULT_CLICK_SELECTOR).unwrap());
	tracker.handle_host_event(HostEvent::Click {
		target: crosstrack::ElementRef(1),
	});
	assert_eq!(tracker.queue_len(), 0);
}

#[tokio::test]
async fn host_events_after_shutdown_are_ignored() {
	let beacon = Arc::new(RecordingBeacon::default());
	let host = FakeHost::new(800.0);
	let link = host.element(None, &["a"], "A", Some("x"), Rect::default());
	let tracker = builder(&beacon).host(host).init().await.unwrap();

	tracker.track_click("a").unwrap();
	tracker.shutdown().await.unwrap();
	tracker.handle_host_event(HostEvent::Click { target: link });

	assert_eq!(tracker.queue_len(), 0);
	assert!(beacon.batches().is_empty());
}

#[tokio::test]
async fn teardown_flushes_pending_page_view() {
	let beacon = Arc::new(RecordingBeacon::default());
	let tracker = builder(&beacon)
		.auto_track_page_view(true)
		.init()
		.await
		.unwrap();
	assert_eq!(tracker.queue_len(), 1);

	tracker.handle_host_event(HostEvent::Teardown);

	assert_eq!(beacon.event_names(), vec!["page_view"]);
}

#[tokio::test]
async fn registered_interaction_tracker_emits_through_pipeline() {
	let beacon = Arc::new(RecordingBeacon::default());
	let tracker = builder(&beacon).init().await.unwrap();

	tracker.register_interaction_tracker("video", |tracker: &Tracker, payload: Value| {
		let _ = tracker.track("video_started", payload);
	});
	tracker.register_interaction_tracker("video", |tracker: &Tracker, payload: Value| {
		let _ = tracker.track("video_progress", payload);
	});

	assert!(tracker.trigger_interaction("video", json!({"percent": 25})));
	tracker.flush();

	assert_eq!(beacon.event_names(), vec!["video_progress"]);
}
