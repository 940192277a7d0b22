// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tracker: enrichment, batching, delivery and instrumentation wired
//! together behind one handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crosstrack_core::{
	builtin_events, empty_object, resolve_anonymous_id, DurableStorage, EnvironmentCollector,
	EventRecord, Identity, MemoryStorage, SystemEnvironment,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::{TrackerConfig, UserConfig};
use crate::context::{ContextResolver, ContextStore};
use crate::enrich::Enricher;
use crate::error::{Result, TrackerError};
use crate::forward::{Forwarding, ForwardingTarget};
use crate::instrument::scroll::normalize_threshold;
use crate::instrument::{
	view, ClickDelegation, ElementRef, HostEvent, HostUi, InteractionRegistry, InteractionTracker,
	ScrollObservations,
};
use crate::properties::Properties;
use crate::queue::DeliveryQueue;
use crate::scheduler::FlushScheduler;
use crate::storage::FileStorage;
use crate::transport::{BatchSender, Beacon, HttpBatchSender, Transport};

/// Log target for `verbose_event_logging` output.
pub const TRACK_LOG_TARGET: &str = "crosstrack::track_log";

/// Builder for constructing a [`Tracker`].
#[derive(Default)]
pub struct TrackerBuilder {
	layer: UserConfig,
	storage: Option<Arc<dyn DurableStorage>>,
	environment: Option<Arc<dyn EnvironmentCollector>>,
	host: Option<Arc<dyn HostUi>>,
	beacon: Option<Arc<dyn Beacon>>,
	sender: Option<Arc<dyn BatchSender>>,
	forwarders: Vec<Arc<dyn ForwardingTarget>>,
	context_resolver: Option<Arc<dyn ContextResolver>>,
}

impl TrackerBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Overlays a configuration layer. Keys it sets replace earlier ones.
	pub fn config(mut self, layer: UserConfig) -> Self {
		self.layer = self.layer.overlay(layer);
		self
	}

	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.layer.endpoint = Some(endpoint.into());
		self
	}

	pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
		self.layer.project_id = Some(project_id.into());
		self
	}

	pub fn debug(mut self, enabled: bool) -> Self {
		self.layer.debug = Some(enabled);
		self
	}

	pub fn auto_track_page_view(mut self, enabled: bool) -> Self {
		self.layer.auto_track_page_view = Some(enabled);
		self
	}

	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.layer.user_id = Some(user_id.into());
		self
	}

	/// Sets the flush interval, rounded up to whole milliseconds.
	pub fn flush_interval(mut self, interval: Duration) -> Self {
		let mut millis = interval.as_millis();
		if interval.subsec_nanos() % 1_000_000 != 0 {
			millis += 1;
		}
		self.layer.flush_interval_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
		self
	}

	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.layer.max_batch_size = Some(size);
		self
	}

	/// Durable storage for the anonymous id. Defaults to a JSON file in the
	/// platform data directory, or process memory if there is none.
	pub fn storage(mut self, storage: Arc<dyn DurableStorage>) -> Self {
		self.storage = Some(storage);
		self
	}

	/// Environment collector. Defaults to [`SystemEnvironment`].
	pub fn environment(mut self, environment: Arc<dyn EnvironmentCollector>) -> Self {
		self.environment = Some(environment);
		self
	}

	/// Host UI used for page info and auto-instrumentation.
	pub fn host(mut self, host: Arc<dyn HostUi>) -> Self {
		self.host = Some(host);
		self
	}

	/// Preferred delivery primitive.
	pub fn beacon(mut self, beacon: Arc<dyn Beacon>) -> Self {
		self.beacon = Some(beacon);
		self
	}

	/// Fallback delivery used when there is no beacon. Defaults to
	/// [`HttpBatchSender`].
	pub fn sender(mut self, sender: Arc<dyn BatchSender>) -> Self {
		self.sender = Some(sender);
		self
	}

	/// Appends a forwarding target. Targets run in the order added.
	pub fn forward(mut self, target: Arc<dyn ForwardingTarget>) -> Self {
		self.forwarders.push(target);
		self
	}

	pub fn context_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
		self.context_resolver = Some(resolver);
		self
	}

	/// Resolves configuration and identity, awaits the context resolver and
	/// emits the automatic `page_view`.
	///
	/// Must be called from within a tokio runtime; timers and fallback
	/// deliveries are spawned on it.
	pub async fn init(self) -> Result<Tracker> {
		let config = TrackerConfig::from_layer(self.layer)?;
		let runtime = Handle::current();

		let storage = match self.storage {
			Some(storage) => storage,
			None => default_storage(),
		};
		let anonymous_id = resolve_anonymous_id(storage.as_ref());

		let sender: Arc<dyn BatchSender> = match self.sender {
			Some(sender) => sender,
			None => Arc::new(HttpBatchSender::new()?),
		};
		let transport = Transport::new(config.endpoint.clone(), self.beacon, sender, runtime.clone());

		let environment: Arc<dyn EnvironmentCollector> = match self.environment {
			Some(environment) => environment,
			None => Arc::new(SystemEnvironment::new()),
		};
		let enricher = Enricher::new(
			config.project_id.clone(),
			environment,
			self.host.clone(),
			config.debug,
		);

		let context = ContextStore::new();
		if let Some(resolver) = &self.context_resolver {
			context.resolve_with(resolver.as_ref(), config.debug).await;
		}

		let inner = Arc::new(TrackerInner {
			user_id: RwLock::new(config.user_id.clone()),
			anonymous_id,
			context,
			enricher,
			pipeline: Mutex::new(Pipeline {
				queue: DeliveryQueue::new(),
				scheduler: FlushScheduler::new(config.flush_interval),
			}),
			dispatch: Mutex::new(()),
			dispatch_owner: Mutex::new(None),
			flush_deferred: AtomicBool::new(false),
			transport,
			forwarding: Forwarding::new(self.forwarders, config.debug),
			host: self.host,
			scroll: Mutex::new(ScrollObservations::new()),
			clicks: Mutex::new(ClickDelegation::new()),
			interactions: RwLock::new(InteractionRegistry::new()),
			runtime,
			flush_on_teardown: AtomicBool::new(false),
			closed: AtomicBool::new(false),
			config,
		});
		let tracker = Tracker { inner };

		if tracker.inner.config.auto_track_page_view {
			tracker.track(builtin_events::PAGE_VIEW, empty_object())?;
			tracker.inner.flush_on_teardown.store(true, Ordering::SeqCst);
		}

		info!(
			endpoint = %tracker.inner.config.endpoint,
			project_id = %tracker.inner.config.project_id,
			"Tracker initialized"
		);
		if tracker.inner.config.debug {
			debug!(config = ?tracker.inner.config, "Tracker configuration");
		}

		Ok(tracker)
	}
}

fn default_storage() -> Arc<dyn DurableStorage> {
	match FileStorage::at_default_location() {
		Ok(storage) => Arc::new(storage),
		Err(e) => {
			warn!(error = %e, "Falling back to in-memory storage for the anonymous id");
			Arc::new(MemoryStorage::new())
		}
	}
}

struct Pipeline {
	queue: DeliveryQueue,
	scheduler: FlushScheduler,
}

struct DispatchGuard<'a> {
	_lock: MutexGuard<'a, ()>,
	owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		*self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
	}
}

struct TrackerInner {
	config: TrackerConfig,
	user_id: RwLock<Option<String>>,
	anonymous_id: String,
	context: ContextStore,
	enricher: Enricher,
	pipeline: Mutex<Pipeline>,
	/// Held from drain to the end of dispatch so batches leave in drain order.
	dispatch: Mutex<()>,
	dispatch_owner: Mutex<Option<ThreadId>>,
	flush_deferred: AtomicBool,
	transport: Transport,
	forwarding: Forwarding,
	host: Option<Arc<dyn HostUi>>,
	scroll: Mutex<ScrollObservations>,
	clicks: Mutex<ClickDelegation>,
	interactions: RwLock<InteractionRegistry>,
	runtime: Handle,
	flush_on_teardown: AtomicBool,
	closed: AtomicBool,
}

/// Client-side telemetry tracker.
///
/// Cheap to clone; clones share one pipeline.
///
/// # Example
///
/// ```ignore
/// use crosstrack::{Properties, Tracker};
///
/// let tracker = Tracker::builder()
///     .endpoint("https://collect.example.com/v1/events")
///     .project_id("shop")
///     .init()
///     .await?;
///
/// tracker.track("add_to_cart", Properties::new()
///     .insert("sku", "A-100")
///     .insert("quantity", 2)
/// )?;
///
/// // Flush everything and wait for in-flight deliveries
/// tracker.shutdown().await?;
/// ```
#[derive(Clone)]
pub struct Tracker {
	inner: Arc<TrackerInner>,
}

impl std::fmt::Debug for Tracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracker")
			.field("endpoint", &self.inner.config.endpoint)
			.field("project_id", &self.inner.config.project_id)
			.field("closed", &self.is_closed())
			.finish_non_exhaustive()
	}
}

impl Tracker {
	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	/// Records an event.
	///
	/// The event is enriched and queued, then flushed right away when the
	/// queue reached `max_batch_size` or the event is a priority event;
	/// otherwise a flush is scheduled. `null` data is recorded as `{}`.
	pub fn track(&self, event: &str, data: impl Into<Value>) -> Result<()> {
		self.check_closed()?;

		let data = match data.into() {
			Value::Null => empty_object(),
			data => data,
		};
		let record = self
			.inner
			.enricher
			.enrich(event, data, self.identity(), self.inner.context.get());
		self.log_record(&record);

		let config = &self.inner.config;
		let flush_now = {
			let mut pipeline = self.pipeline();
			pipeline.queue.enqueue(record);
			let flush_now =
				pipeline.queue.len() >= config.max_batch_size || config.is_priority_event(event);
			if !flush_now {
				self.schedule_locked(&mut pipeline);
			}
			flush_now
		};

		if flush_now {
			self.flush();
		}
		Ok(())
	}

	/// Replaces the authenticated user id on subsequent records.
	pub fn set_identity(&self, user_id: Option<String>) {
		*self.inner.user_id.write().unwrap_or_else(PoisonError::into_inner) = user_id;
	}

	pub fn identity(&self) -> Identity {
		let user_id = self
			.inner
			.user_id
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		Identity::new(user_id, self.inner.anonymous_id.as_str())
	}

	pub fn anonymous_id(&self) -> &str {
		&self.inner.anonymous_id
	}

	pub fn config(&self) -> &TrackerConfig {
		&self.inner.config
	}

	/// The context attached to every record.
	pub fn context(&self) -> Value {
		self.inner.context.get()
	}

	/// Drains one batch through transport and forwarding. Cancels the pending
	/// timer and re-arms it when records remain. Returns the batch size.
	///
	/// Flushes are serialised: a flush on another thread waits until the
	/// current batch has been handed to every target. A flush requested by a
	/// forwarding target while its batch is being dispatched returns 0 and
	/// runs once that dispatch completes.
	pub fn flush(&self) -> usize {
		let Some(_dispatch) = self.begin_dispatch() else {
			self.inner.flush_deferred.store(true, Ordering::SeqCst);
			return 0;
		};

		let flushed = self.dispatch_next(true);
		while self.inner.flush_deferred.swap(false, Ordering::SeqCst) {
			self.dispatch_next(true);
		}
		flushed
	}

	pub fn queue_len(&self) -> usize {
		self.pipeline().queue.len()
	}

	pub fn is_flush_armed(&self) -> bool {
		self.pipeline().scheduler.is_armed()
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	/// Shuts the tracker down.
	///
	/// Drains the whole queue batch by batch, then waits up to
	/// `shutdown_grace` for in-flight fallback deliveries. Calling it again
	/// is a no-op.
	pub async fn shutdown(&self) -> Result<()> {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		self.inner.flush_on_teardown.store(false, Ordering::SeqCst);

		info!("Shutting down tracker");

		let flushed = self.drain_all();

		if !self
			.inner
			.transport
			.drain_in_flight(self.inner.config.shutdown_grace)
			.await
		{
			warn!(
				in_flight = self.inner.transport.in_flight(),
				"Timed out waiting for in-flight deliveries"
			);
		}

		info!(flushed, "Tracker shutdown complete");
		Ok(())
	}

	/// Feeds host UI activity into the instrumentation.
	pub fn handle_host_event(&self, event: HostEvent) {
		if self.is_closed() {
			return;
		}

		match event {
			HostEvent::Intersection {
				element,
				ratio,
				is_intersecting,
			} => self.on_intersection(element, ratio, is_intersecting),
			HostEvent::Click { target } => self.on_click(target),
			HostEvent::Teardown => {
				if self.inner.flush_on_teardown.load(Ordering::SeqCst) {
					debug!("Host teardown, flushing queue");
					self.flush();
				}
			}
		}
	}

	/// Emits `auto_view` if the element matching `selector` is fully inside
	/// the viewport right now. Returns whether the event was emitted.
	pub fn track_view(&self, selector: &str) -> Result<bool> {
		self.check_closed()?;
		let Some(host) = &self.inner.host else {
			return Ok(false);
		};
		if !view::is_fully_visible(host.as_ref(), selector) {
			return Ok(false);
		}

		self.track(
			builtin_events::AUTO_VIEW,
			Properties::new().insert("selector", selector),
		)?;
		Ok(true)
	}

	/// Registers a one-shot scroll observation: the first time the element
	/// matching `selector` is at least `threshold` visible, `auto_scroll` is
	/// emitted. `threshold` is clamped to `[0, 1]`. Returns whether an
	/// observation was registered.
	pub fn track_scroll(&self, selector: &str, threshold: f64) -> Result<bool> {
		self.check_closed()?;
		let Some(host) = &self.inner.host else {
			return Ok(false);
		};
		let Some(threshold) = normalize_threshold(threshold) else {
			if self.inner.config.debug {
				warn!(selector, "Ignoring scroll observation with NaN threshold");
			}
			return Ok(false);
		};
		let Some(element) = host.query_selector(selector) else {
			return Ok(false);
		};

		self.lock_scroll().register(selector, element, threshold);
		host.observe(element, threshold);
		debug!(selector, threshold, "Observing scroll depth");
		Ok(true)
	}

	/// Wires click delegation for `selector`. Wiring the same selector again
	/// does nothing and returns `false`.
	pub fn track_click(&self, selector: &str) -> Result<bool> {
		self.check_closed()?;
		if self.inner.host.is_none() {
			return Ok(false);
		}

		let added = self
			.inner
			.clicks
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.add(selector);
		if added {
			debug!(selector, "Delegating clicks");
		}
		Ok(added)
	}

	/// Registers a named interaction tracker, replacing any earlier one with
	/// the same name. Empty names are ignored.
	pub fn register_interaction_tracker(
		&self,
		name: &str,
		handler: impl InteractionTracker + 'static,
	) -> bool {
		self.inner
			.interactions
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.register(name, Arc::new(handler))
	}

	/// Invokes the interaction tracker registered under `name`. Returns
	/// `false` if there is none.
	pub fn trigger_interaction(&self, name: &str, payload: impl Into<Value>) -> bool {
		let handler = self
			.inner
			.interactions
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(name);

		match handler {
			Some(handler) => {
				handler.on_trigger(self, payload.into());
				true
			}
			None => false,
		}
	}

	fn on_timer(&self, generation: u64) {
		let fired = self.pipeline().scheduler.fire(generation);
		if fired {
			self.flush();
		}
	}

	fn on_intersection(&self, element: ElementRef, ratio: f64, is_intersecting: bool) {
		let outcome = self
			.lock_scroll()
			.on_intersection(element, ratio, is_intersecting);

		for hit in outcome.hits {
			self.emit(
				builtin_events::AUTO_SCROLL,
				Properties::new()
					.insert("selector", hit.selector)
					.insert("ratio", hit.ratio),
			);
		}

		if outcome.release {
			if let Some(host) = &self.inner.host {
				host.unobserve(element);
			}
		}
	}

	fn on_click(&self, target: ElementRef) {
		let Some(host) = &self.inner.host else {
			return;
		};
		let hits = self
			.inner
			.clicks
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.resolve(host.as_ref(), target);

		for hit in hits {
			self.emit(
				builtin_events::AUTO_CLICK,
				Properties::new()
					.insert("selector", hit.selector)
					.insert("tag", hit.tag)
					.insert_opt("text", hit.text),
			);
		}
	}

	fn emit(&self, event: &str, data: Properties) {
		if let Err(e) = self.track(event, data) {
			debug!(event, error = %e, "Dropped instrumentation event");
		}
	}

	/// `None` when this thread is already dispatching.
	fn begin_dispatch(&self) -> Option<DispatchGuard<'_>> {
		let current = thread::current().id();
		let owner = &self.inner.dispatch_owner;
		if *owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(current) {
			return None;
		}

		let lock = self
			.inner
			.dispatch
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		*owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(current);
		Some(DispatchGuard { _lock: lock, owner })
	}

	/// Caller holds the dispatch guard.
	fn dispatch_next(&self, rearm: bool) -> usize {
		let batch = {
			let mut pipeline = self.pipeline();
			pipeline.scheduler.cancel();
			let batch = pipeline.queue.drain(self.inner.config.max_batch_size);
			if rearm && !pipeline.queue.is_empty() {
				self.schedule_locked(&mut pipeline);
			}
			batch
		};

		if !batch.is_empty() {
			self.dispatch(&batch);
		}
		batch.len()
	}

	fn drain_all(&self) -> usize {
		let Some(_dispatch) = self.begin_dispatch() else {
			return 0;
		};

		let mut flushed = 0;
		loop {
			let count = self.dispatch_next(false);
			if count == 0 {
				break;
			}
			flushed += count;
		}
		flushed
	}

	fn dispatch(&self, batch: &[EventRecord]) {
		match self.inner.transport.send(batch) {
			Ok(path) => debug!(count = batch.len(), path = ?path, "Dispatched event batch"),
			Err(e) => warn!(count = batch.len(), error = %e, "Failed to encode event batch"),
		}

		let report = self.inner.forwarding.fan_out(batch);
		if report.failed > 0 {
			warn!(
				count = batch.len(),
				delivered = report.delivered,
				failed = report.failed,
				"Forwarding targets failed"
			);
		}
	}

	fn schedule_locked(&self, pipeline: &mut Pipeline) {
		let weak: Weak<TrackerInner> = Arc::downgrade(&self.inner);
		let runtime = &self.inner.runtime;
		pipeline.scheduler.schedule(|generation, interval| {
			runtime
				.spawn(async move {
					tokio::time::sleep(interval).await;
					if let Some(inner) = weak.upgrade() {
						Tracker { inner }.on_timer(generation);
					}
				})
				.abort_handle()
		});
	}

	fn log_record(&self, record: &EventRecord) {
		let config = &self.inner.config;
		if config.debug {
			info!(event = %record.name(), ts = %record.timestamp_iso(), "track");
		}
		if config.verbose_event_logging {
			match serde_json::to_string_pretty(record) {
				Ok(json) => info!(target: TRACK_LOG_TARGET, "{json}"),
				Err(e) => warn!(error = %e, "Failed to render event for track log"),
			}
		}
	}

	fn pipeline(&self) -> MutexGuard<'_, Pipeline> {
		self.inner
			.pipeline
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
	}

	fn lock_scroll(&self) -> MutexGuard<'_, ScrollObservations> {
		self.inner
			.scroll
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
	}

	fn check_closed(&self) -> Result<()> {
		if self.is_closed() {
			Err(TrackerError::ClientShutdown)
		} else {
			Ok(())
		}
	}
}
