// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process configuration.
//!
//! Loaded once at startup from the environment. Every setting has a
//! default; a setting that is present but malformed is an error.

use std::time::Duration;

use bastion_protocol::BackingStore;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::env::{load_env, load_env_keep_empty, EnvError};

pub const DEFAULT_AGENT_ADDRESS: &str = "file:///run/spire/svid";
pub const DEFAULT_SAFE_ENDPOINT_URL: &str =
	"https://bastion-safe.bastion-system.svc.cluster.local:8443/";
pub const DEFAULT_SENTINEL_PREFIX: &str =
	"spiffe://bastion.dev/workload/bastion-sentinel/ns/bastion-system/sa/bastion-sentinel/n/";
pub const DEFAULT_SAFE_PREFIX: &str =
	"spiffe://bastion.dev/workload/bastion-safe/ns/bastion-system/sa/bastion-safe/n/";
pub const DEFAULT_WORKLOAD_PREFIX: &str = "spiffe://bastion.dev/workload/";
pub const DEFAULT_GENERATION_PREFIX: &str = "gen:";
pub const DEFAULT_ACQUISITION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

const AGENT_ADDRESS_VAR: &str = "BASTION_SPIFFE_ENDPOINT_SOCKET";
const SAFE_ENDPOINT_URL_VAR: &str = "BASTION_SAFE_ENDPOINT_URL";
const SENTINEL_PREFIX_VAR: &str = "BASTION_SPIFFEID_PREFIX_SENTINEL";
const SAFE_PREFIX_VAR: &str = "BASTION_SPIFFEID_PREFIX_SAFE";
const WORKLOAD_PREFIX_VAR: &str = "BASTION_SPIFFEID_PREFIX_WORKLOAD";
const BACKING_STORE_VAR: &str = "BASTION_SAFE_BACKING_STORE";
const GENERATION_PREFIX_VAR: &str = "BASTION_SENTINEL_SECRET_GENERATION_PREFIX";
const ACQUISITION_TIMEOUT_VAR: &str = "BASTION_SAFE_SOURCE_ACQUISITION_TIMEOUT";
const AUDIT_QUEUE_CAPACITY_VAR: &str = "BASTION_AUDIT_QUEUE_CAPACITY";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error(transparent)]
	Env(#[from] EnvError),

	#[error("{var} is not a valid URL: {source}")]
	InvalidUrl {
		var: &'static str,
		#[source]
		source: url::ParseError,
	},

	#[error("{var} must be 'file' or 'memory', got '{value}'")]
	InvalidBackingStore { var: &'static str, value: String },

	#[error("{var} must be a positive integer, got '{value}'")]
	InvalidNumber { var: &'static str, value: String },
}

/// Settings shared by Sentinel and Safe.
#[derive(Debug, Clone)]
pub struct BastionConfig {
	/// Where the local identity agent publishes SVIDs.
	pub agent_address: String,
	/// Base URL of the Safe API.
	pub safe_endpoint_url: Url,
	pub sentinel_prefix: String,
	pub safe_prefix: String,
	pub workload_prefix: String,
	/// Backing store used when a command names neither `file` nor `memory`.
	pub default_backing_store: BackingStore,
	/// Marker that turns a secret value into a generation pattern.
	pub generation_prefix: String,
	/// Upper bound on identity acquisition before a command is abandoned.
	pub acquisition_timeout: Duration,
	pub audit_queue_capacity: usize,
}

impl Default for BastionConfig {
	fn default() -> Self {
		Self {
			agent_address: DEFAULT_AGENT_ADDRESS.to_string(),
			safe_endpoint_url: Url::parse(DEFAULT_SAFE_ENDPOINT_URL)
				.unwrap_or_else(|_| unreachable!("default Safe URL is a valid literal")),
			sentinel_prefix: DEFAULT_SENTINEL_PREFIX.to_string(),
			safe_prefix: DEFAULT_SAFE_PREFIX.to_string(),
			workload_prefix: DEFAULT_WORKLOAD_PREFIX.to_string(),
			default_backing_store: BackingStore::File,
			generation_prefix: DEFAULT_GENERATION_PREFIX.to_string(),
			acquisition_timeout: Duration::from_millis(DEFAULT_ACQUISITION_TIMEOUT_MS),
			audit_queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
		}
	}
}

impl BastionConfig {
	/// Load configuration from the process environment.
	#[instrument(skip_all)]
	pub fn from_env() -> ConfigResult<Self> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	/// Load configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let defaults = Self::default();
		let get = |var: &str| load_env(var, &lookup);

		let safe_endpoint_url = match get(SAFE_ENDPOINT_URL_VAR)? {
			Some(raw) => Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
				var: SAFE_ENDPOINT_URL_VAR,
				source,
			})?,
			None => defaults.safe_endpoint_url,
		};

		let default_backing_store = match get(BACKING_STORE_VAR)? {
			Some(raw) => BackingStore::parse(&raw).ok_or(ConfigError::InvalidBackingStore {
				var: BACKING_STORE_VAR,
				value: raw,
			})?,
			None => defaults.default_backing_store,
		};

		let acquisition_timeout = match get(ACQUISITION_TIMEOUT_VAR)? {
			Some(raw) => Duration::from_millis(parse_positive(ACQUISITION_TIMEOUT_VAR, &raw)?),
			None => defaults.acquisition_timeout,
		};

		let audit_queue_capacity = match get(AUDIT_QUEUE_CAPACITY_VAR)? {
			Some(raw) => usize::try_from(parse_positive(AUDIT_QUEUE_CAPACITY_VAR, &raw)?)
				.map_err(|_| ConfigError::InvalidNumber {
					var: AUDIT_QUEUE_CAPACITY_VAR,
					value: raw,
				})?,
			None => defaults.audit_queue_capacity,
		};

		Ok(Self {
			agent_address: get(AGENT_ADDRESS_VAR)?.unwrap_or(defaults.agent_address),
			safe_endpoint_url,
			sentinel_prefix: get(SENTINEL_PREFIX_VAR)?.unwrap_or(defaults.sentinel_prefix),
			safe_prefix: get(SAFE_PREFIX_VAR)?.unwrap_or(defaults.safe_prefix),
			workload_prefix: get(WORKLOAD_PREFIX_VAR)?.unwrap_or(defaults.workload_prefix),
			default_backing_store,
			// Set but empty turns generation off.
			generation_prefix: load_env_keep_empty(GENERATION_PREFIX_VAR, &lookup)?
				.unwrap_or(defaults.generation_prefix),
			acquisition_timeout,
			audit_queue_capacity,
		})
	}
}

fn parse_positive(var: &'static str, raw: &str) -> ConfigResult<u64> {
	match raw.trim().parse::<u64>() {
		Ok(value) if value > 0 => Ok(value),
		_ => Err(ConfigError::InvalidNumber {
			var,
			value: raw.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn config_from(pairs: &[(&str, &str)]) -> ConfigResult<BastionConfig> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		BastionConfig::from_lookup(|var| map.get(var).cloned())
	}

	#[test]
	fn defaults_apply_when_nothing_is_set() {
		let config = config_from(&[]).unwrap();
		assert_eq!(config.agent_address, DEFAULT_AGENT_ADDRESS);
		assert_eq!(config.safe_endpoint_url.as_str(), DEFAULT_SAFE_ENDPOINT_URL);
		assert_eq!(config.default_backing_store, BackingStore::File);
		assert_eq!(config.generation_prefix, "gen:");
		assert_eq!(config.acquisition_timeout, Duration::from_secs(10));
		assert_eq!(config.audit_queue_capacity, DEFAULT_AUDIT_QUEUE_CAPACITY);
	}

	#[test]
	fn overrides_are_read() {
		let config = config_from(&[
			("BASTION_SAFE_ENDPOINT_URL", "https://safe.local:9443/"),
			("BASTION_SPIFFEID_PREFIX_SENTINEL", "spiffe://example.org/sentinel/"),
			("BASTION_SAFE_BACKING_STORE", "memory"),
			("BASTION_SAFE_SOURCE_ACQUISITION_TIMEOUT", "1500"),
			("BASTION_SENTINEL_SECRET_GENERATION_PREFIX", "rand:"),
		])
		.unwrap();

		assert_eq!(config.safe_endpoint_url.as_str(), "https://safe.local:9443/");
		assert_eq!(config.sentinel_prefix, "spiffe://example.org/sentinel/");
		assert_eq!(config.default_backing_store, BackingStore::Memory);
		assert_eq!(config.acquisition_timeout, Duration::from_millis(1500));
		assert_eq!(config.generation_prefix, "rand:");
	}

	#[test]
	fn empty_generation_prefix_is_kept() {
		let config = config_from(&[("BASTION_SENTINEL_SECRET_GENERATION_PREFIX", "")]).unwrap();
		assert_eq!(config.generation_prefix, "");

		let config = config_from(&[("BASTION_SPIFFEID_PREFIX_SAFE", "")]).unwrap();
		assert_eq!(config.safe_prefix, DEFAULT_SAFE_PREFIX);
	}

	#[test]
	fn rejects_unknown_backing_store() {
		let err = config_from(&[("BASTION_SAFE_BACKING_STORE", "s3")]).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidBackingStore { .. }));
	}

	#[test]
	fn rejects_zero_or_garbage_timeout() {
		for raw in ["0", "-5", "soon"] {
			let err = config_from(&[("BASTION_SAFE_SOURCE_ACQUISITION_TIMEOUT", raw)]).unwrap_err();
			assert!(matches!(err, ConfigError::InvalidNumber { .. }), "{raw}");
		}
	}

	#[test]
	fn rejects_malformed_url() {
		let err = config_from(&[("BASTION_SAFE_ENDPOINT_URL", "not a url")]).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidUrl { .. }));
	}
}
