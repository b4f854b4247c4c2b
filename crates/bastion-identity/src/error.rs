// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

use crate::gate::Role;

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("identity agent at {address} is unreachable: {reason}")]
	AgentUnreachable { address: String, reason: String },

	#[error("identity agent has no identity to hand out: {0}")]
	NoIdentity(String),

	#[error("invalid identity document: {0}")]
	InvalidDocument(String),

	#[error("acquired identity '{spiffe_id}' does not carry the {expected} role")]
	UnexpectedIdentity { spiffe_id: String, expected: Role },

	#[error("identity acquisition timed out after {0:?}")]
	Timeout(Duration),

	#[error("identity acquisition was cancelled")]
	Cancelled,

	#[error("identity acquisition worker stopped without reporting")]
	WorkerLost,

	#[error("failed to build secure channel: {0}")]
	Channel(String),
}

impl IdentityError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, IdentityError::Timeout(_))
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, IdentityError::Cancelled)
	}
}
