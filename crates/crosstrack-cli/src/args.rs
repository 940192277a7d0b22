// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use crosstrack::UserConfig;

/// Send telemetry events to a crosstrack collector
#[derive(Parser, Debug)]
#[command(name = "crosstrack", version)]
pub struct Args {
	/// Config file (defaults to the platform config dir)
	#[arg(long, env = "CROSSTRACK_CONFIG", global = true)]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub overrides: Overrides,

	#[command(subcommand)]
	pub command: Command,
}

/// Flags that override the file and environment layers.
#[derive(ClapArgs, Debug, Default)]
pub struct Overrides {
	/// Collector URL
	#[arg(long, global = true)]
	pub endpoint: Option<String>,

	#[arg(long, global = true)]
	pub project_id: Option<String>,

	#[arg(long, global = true)]
	pub user_id: Option<String>,

	/// Log swallowed delivery and consumer failures
	#[arg(long, global = true)]
	pub debug: bool,

	/// Log every record as pretty JSON
	#[arg(long, global = true)]
	pub verbose_events: bool,

	/// Do not emit the automatic page_view on start
	#[arg(long, global = true)]
	pub no_page_view: bool,

	#[arg(long, global = true)]
	pub max_batch_size: Option<usize>,

	#[arg(long, global = true)]
	pub flush_interval_ms: Option<u64>,

	/// Context attached to every record, as a JSON object
	#[arg(long, global = true)]
	pub context: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Track a single event
	Track {
		event: String,

		/// Event data as JSON
		#[arg(long)]
		data: Option<String>,
	},
	/// Track every event in a JSON Lines file
	Replay { file: PathBuf },
}

impl Overrides {
	/// The flag layer. Switches that are off leave the lower layers alone.
	pub fn to_layer(&self) -> UserConfig {
		UserConfig {
			endpoint: self.endpoint.clone(),
			project_id: self.project_id.clone(),
			user_id: self.user_id.clone(),
			debug: self.debug.then_some(true),
			verbose_event_logging: self.verbose_events.then_some(true),
			auto_track_page_view: self.no_page_view.then_some(false),
			max_batch_size: self.max_batch_size,
			flush_interval_ms: self.flush_interval_ms,
			..Default::default()
		}
	}
}
