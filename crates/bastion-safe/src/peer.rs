// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::HeaderMap;
use bastion_audit::new_correlation_id;

pub use bastion_protocol::paths::CORRELATION_ID_HEADER;

/// The caller's SPIFFE ID, taken from its verified client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity(pub String);

impl PeerIdentity {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// The caller-supplied correlation id, or a fresh one.
pub fn correlation_id(headers: &HeaderMap) -> String {
	headers
		.get(CORRELATION_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_string)
		.unwrap_or_else(new_correlation_id)
}
