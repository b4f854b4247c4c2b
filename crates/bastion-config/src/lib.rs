// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for Bastion processes.
//!
//! - [`BastionConfig`]: every tunable Sentinel and Safe read at startup
//! - [`load_env`]: `VAR` / `VAR_FILE` lookup shared by all settings

pub mod config;
pub mod env;

pub use config::{
	BastionConfig, ConfigError, ConfigResult, DEFAULT_ACQUISITION_TIMEOUT_MS,
	DEFAULT_AGENT_ADDRESS, DEFAULT_AUDIT_QUEUE_CAPACITY, DEFAULT_GENERATION_PREFIX,
	DEFAULT_SAFE_ENDPOINT_URL, DEFAULT_SAFE_PREFIX, DEFAULT_SENTINEL_PREFIX,
	DEFAULT_WORKLOAD_PREFIX,
};
pub use env::{load_env, load_env_keep_empty, EnvError};
