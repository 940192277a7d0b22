// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The delivery queue: pending records in delivery order.

use std::collections::VecDeque;

use crosstrack_core::EventRecord;

/// Ordered buffer of records waiting for the next flush.
///
/// The queue is unbounded and never drops a record; records only leave it
/// through [`DeliveryQueue::drain`]. It does no locking of its own, the
/// tracker keeps it behind its pipeline lock.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
	records: VecDeque<EventRecord>,
}

impl DeliveryQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a record to the tail.
	pub fn enqueue(&mut self, record: EventRecord) {
		self.records.push_back(record);
	}

	/// Removes and returns up to `max` records from the head, oldest first.
	pub fn drain(&mut self, max: usize) -> Vec<EventRecord> {
		let count = max.min(self.records.len());
		self.records.drain(..count).collect()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
