// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Debounced flush timer.
//!
//! The scheduler is either idle or armed with exactly one pending timer.
//! Arming spawns the timer task through a caller-supplied closure, so the
//! scheduler itself stays independent of what a flush does. Every armed
//! timer carries a generation number; when a timer wakes up it must present
//! its generation to [`FlushScheduler::fire`], and a timer that was
//! cancelled or superseded in the meantime is told to do nothing.

use std::time::Duration;

use tokio::task::AbortHandle;

#[derive(Debug)]
enum TimerState {
	Idle,
	Armed { generation: u64, handle: AbortHandle },
}

/// Two-state flush timer: idle, or armed with one pending timer.
#[derive(Debug)]
pub struct FlushScheduler {
	interval: Duration,
	state: TimerState,
	next_generation: u64,
}

impl FlushScheduler {
	pub fn new(interval: Duration) -> Self {
		Self {
			interval,
			state: TimerState::Idle,
			next_generation: 0,
		}
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Arms the timer unless one is already pending.
	///
	/// `spawn` receives the new generation and the interval and must return
	/// the abort handle of the spawned timer task. Returns `true` when a
	/// timer was armed.
	pub fn schedule<F>(&mut self, spawn: F) -> bool
	where
		F: FnOnce(u64, Duration) -> AbortHandle,
	{
		if self.is_armed() {
			return false;
		}

		let generation = self.next_generation;
		self.next_generation += 1;
		let handle = spawn(generation, self.interval);
		self.state = TimerState::Armed { generation, handle };
		true
	}

	/// Called by a timer task when it wakes. Returns `true` (and goes idle)
	/// only if `generation` is the currently pending timer.
	pub fn fire(&mut self, generation: u64) -> bool {
		match self.state {
			TimerState::Armed { generation: armed, .. } if armed == generation => {
				self.state = TimerState::Idle;
				true
			}
			_ => false,
		}
	}

	/// Aborts the pending timer, if any. Returns `true` if one was pending.
	pub fn cancel(&mut self) -> bool {
		match std::mem::replace(&mut self.state, TimerState::Idle) {
			TimerState::Armed { handle, .. } => {
				handle.abort();
				true
			}
			TimerState::Idle => false,
		}
	}

	pub fn is_armed(&self) -> bool {
		matches!(self.state, TimerState::Armed { .. })
	}

	/// Generation of the pending timer, if armed.
	pub fn armed_generation(&self) -> Option<u64> {
		match self.state {
			TimerState::Armed { generation, .. } => Some(generation),
			TimerState::Idle => None,
		}
	}
}
