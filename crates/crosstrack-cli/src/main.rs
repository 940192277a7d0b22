// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod replay;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crosstrack::{load_layers, StaticContext, Tracker};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();

	let layer = load_layers(args.config.as_deref())?.overlay(args.overrides.to_layer());
	let mut builder = Tracker::builder().config(layer);
	if let Some(raw) = &args.overrides.context {
		let context = parse_json(raw).context("--context is not valid JSON")?;
		builder = builder.context_resolver(Arc::new(StaticContext(context)));
	}
	let tracker = builder.init().await?;

	let tracked = match &args.command {
		Command::Track { event, data } => {
			let data = match data {
				Some(raw) => parse_json(raw).context("--data is not valid JSON")?,
				None => Value::Null,
			};
			tracker.track(event, data)?;
			1
		}
		Command::Replay { file } => {
			let events = replay::read_events(file)?;
			for event in &events {
				tracker.track(&event.event, event.data.clone())?;
			}
			events.len()
		}
	};

	tracker.shutdown().await?;
	info!(tracked, anonymous_id = %tracker.anonymous_id(), "Done");
	Ok(())
}

fn parse_json(raw: &str) -> Result<Value> {
	Ok(serde_json::from_str(raw)?)
}
