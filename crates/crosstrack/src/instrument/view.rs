// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Point-in-time visibility check.

use super::host::HostUi;

/// Selector checked when none is given.
pub const DEFAULT_VIEW_SELECTOR: &str = "body";

/// Whether the first element matching `selector` is fully inside the
/// viewport right now. A missing element or bounding box counts as not
/// visible.
pub fn is_fully_visible(host: &dyn HostUi, selector: &str) -> bool {
	let Some(element) = host.query_selector(selector) else {
		return false;
	};
	host
		.bounding_rect(element)
		.is_some_and(|rect| rect.fits_vertically(host.viewport_height()))
}
