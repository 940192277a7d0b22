// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process forwarding of flushed batches.
//!
//! Every flushed batch is replayed to each registered [`ForwardingTarget`],
//! synchronously and in registration order, after the batch has been handed
//! to the transport. A target that returns an error or panics is skipped;
//! the remaining targets still receive the batch.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crosstrack_core::EventRecord;
use tracing::warn;

/// Error type returned by forwarding targets.
pub type ForwardError = Box<dyn std::error::Error + Send + Sync>;

/// An in-process consumer of flushed batches.
pub trait ForwardingTarget: Send + Sync {
	/// Name used in diagnostics.
	fn name(&self) -> &str;

	/// Receives a flushed batch. Must not block for long; it runs on the
	/// flush path.
	fn forward(&self, batch: &[EventRecord]) -> Result<(), ForwardError>;
}

/// Adapts a closure into a [`ForwardingTarget`].
///
/// ```
/// use crosstrack::FnForwarder;
///
/// let target = FnForwarder::new("stdout", |batch| {
///     println!("{} events", batch.len());
///     Ok(())
/// });
/// ```
pub struct FnForwarder<F> {
	name: String,
	handler: F,
}

impl<F> FnForwarder<F> {
	pub fn new(name: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&[EventRecord]) -> Result<(), ForwardError> + Send + Sync,
	{
		Self {
			name: name.into(),
			handler,
		}
	}
}

impl<F> ForwardingTarget for FnForwarder<F>
where
	F: Fn(&[EventRecord]) -> Result<(), ForwardError> + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn forward(&self, batch: &[EventRecord]) -> Result<(), ForwardError> {
		(self.handler)(batch)
	}
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
	pub delivered: usize,
	pub failed: usize,
}

/// The ordered set of forwarding targets.
#[derive(Clone, Default)]
pub struct Forwarding {
	targets: Vec<Arc<dyn ForwardingTarget>>,
	debug: bool,
}

impl Forwarding {
	/// `debug` enables a warning for every failing target.
	pub fn new(targets: Vec<Arc<dyn ForwardingTarget>>, debug: bool) -> Self {
		Self { targets, debug }
	}

	pub fn len(&self) -> usize {
		self.targets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.targets.is_empty()
	}

	/// Hands `batch` to every target in order, isolating failures.
	pub fn fan_out(&self, batch: &[EventRecord]) -> FanOutReport {
		let mut report = FanOutReport::default();

		for target in &self.targets {
			let outcome = catch_unwind(AssertUnwindSafe(|| target.forward(batch)));
			match outcome {
				Ok(Ok(())) => report.delivered += 1,
				Ok(Err(e)) => {
					report.failed += 1;
					if self.debug {
						warn!(target_name = %target.name(), error = %e, "Forward pipeline failed");
					}
				}
				Err(panic) => {
					report.failed += 1;
					if self.debug {
						warn!(
							target_name = %target.name(),
							panic = %panic_message(&*panic),
							"Forward pipeline panicked"
						);
					}
				}
			}
		}

		report
	}
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	fn batch(n: usize) -> Vec<EventRecord> {
		(0..n)
			.map(|i| EventRecord::new(format!("event{i}"), "test_project"))
			.collect()
	}

	fn recorder(name: &str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn ForwardingTarget> {
		let name_owned = name.to_string();
		Arc::new(FnForwarder::new(name, move |batch: &[EventRecord]| {
			log.lock()
				.unwrap()
				.push(format!("{}:{}", name_owned, batch.len()));
			Ok(())
		}))
	}

	#[test]
	fn test_targets_run_in_registration_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let forwarding = Forwarding::new(
			vec![recorder("first", log.clone()), recorder("second", log.clone())],
			false,
		);

		let report = forwarding.fan_out(&batch(3));
		assert_eq!(report, FanOutReport { delivered: 2, failed: 0 });
		assert_eq!(*log.lock().unwrap(), vec!["first:3", "second:3"]);
	}

	#[test]
	fn test_error_does_not_stop_later_targets() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let failing: Arc<dyn ForwardingTarget> =
			Arc::new(FnForwarder::new("failing", |_: &[EventRecord]| Err("boom".into())));
		let forwarding = Forwarding::new(vec![failing, recorder("after", log.clone())], true);

		let report = forwarding.fan_out(&batch(2));
		assert_eq!(report, FanOutReport { delivered: 1, failed: 1 });
		assert_eq!(*log.lock().unwrap(), vec!["after:2"]);
	}

	#[test]
	fn test_panic_does_not_stop_later_targets() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let panicking: Arc<dyn ForwardingTarget> = Arc::new(FnForwarder::new(
			"panicking",
			|_: &[EventRecord]| -> Result<(), ForwardError> { panic!("consumer bug") },
		));
		let forwarding = Forwarding::new(vec![panicking, recorder("after", log.clone())], true);

		let report = forwarding.fan_out(&batch(1));
		assert_eq!(report, FanOutReport { delivered: 1, failed: 1 });
		assert_eq!(*log.lock().unwrap(), vec!["after:1"]);
	}

	#[test]
	fn test_empty_forwarding_is_noop() {
		let forwarding = Forwarding::default();
		assert!(forwarding.is_empty());
		assert_eq!(forwarding.fan_out(&batch(1)), FanOutReport::default());
	}

	#[test]
	fn test_panic_message_extraction() {
		let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
		assert_eq!(panic_message(&*boxed), "static message");
		let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
		assert_eq!(panic_message(&*boxed), "owned");
	}
}
