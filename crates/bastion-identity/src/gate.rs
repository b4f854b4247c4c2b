// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role classification of SPIFFE IDs.
//!
//! A SPIFFE ID belongs to a role when it begins with that role's configured
//! prefix. The comparison is a plain, case-sensitive byte prefix match with
//! no normalisation. An empty prefix therefore admits every identity, so
//! deployments must configure prefixes carefully.
//!
//! These checks are only meaningful on identities taken from a certificate
//! that has already been verified against the trust bundle.

use std::fmt;

use bastion_config::BastionConfig;

/// The parties that take part in the command protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	Sentinel,
	Safe,
	Workload,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Sentinel => "sentinel",
			Role::Safe => "safe",
			Role::Workload => "workload",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub fn is_sentinel(spiffe_id: &str, prefix: &str) -> bool {
	spiffe_id.starts_with(prefix)
}

pub fn is_safe(spiffe_id: &str, prefix: &str) -> bool {
	spiffe_id.starts_with(prefix)
}

pub fn is_workload(spiffe_id: &str, prefix: &str) -> bool {
	spiffe_id.starts_with(prefix)
}

/// The three role prefixes of a deployment, bundled for convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGate {
	sentinel_prefix: String,
	safe_prefix: String,
	workload_prefix: String,
}

impl IdentityGate {
	pub fn new(
		sentinel_prefix: impl Into<String>,
		safe_prefix: impl Into<String>,
		workload_prefix: impl Into<String>,
	) -> Self {
		Self {
			sentinel_prefix: sentinel_prefix.into(),
			safe_prefix: safe_prefix.into(),
			workload_prefix: workload_prefix.into(),
		}
	}

	pub fn from_config(config: &BastionConfig) -> Self {
		Self::new(
			config.sentinel_prefix.clone(),
			config.safe_prefix.clone(),
			config.workload_prefix.clone(),
		)
	}

	pub fn is_sentinel(&self, spiffe_id: &str) -> bool {
		is_sentinel(spiffe_id, &self.sentinel_prefix)
	}

	pub fn is_safe(&self, spiffe_id: &str) -> bool {
		is_safe(spiffe_id, &self.safe_prefix)
	}

	pub fn is_workload(&self, spiffe_id: &str) -> bool {
		is_workload(spiffe_id, &self.workload_prefix)
	}

	pub fn has_role(&self, spiffe_id: &str, role: Role) -> bool {
		match role {
			Role::Sentinel => self.is_sentinel(spiffe_id),
			Role::Safe => self.is_safe(spiffe_id),
			Role::Workload => self.is_workload(spiffe_id),
		}
	}

	pub fn prefix(&self, role: Role) -> &str {
		match role {
			Role::Sentinel => &self.sentinel_prefix,
			Role::Safe => &self.safe_prefix,
			Role::Workload => &self.workload_prefix,
		}
	}
}
