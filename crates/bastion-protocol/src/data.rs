// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage policy types and the internal Sentinel command.

use std::fmt;

use bastion_common_secret::REDACTED;
use serde::{Deserialize, Serialize};

/// Where Safe persists a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackingStore {
	File,
	Memory,
}

impl BackingStore {
	/// Parse one of the two recognized literals (`file`, `memory`).
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"file" => Some(BackingStore::File),
			"memory" => Some(BackingStore::Memory),
			_ => None,
		}
	}

	/// Resolve operator input, falling back to `default` for anything that is
	/// not a recognized literal (including the empty string).
	pub fn resolve(value: &str, default: BackingStore) -> Self {
		Self::parse(value).unwrap_or(default)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			BackingStore::File => "file",
			BackingStore::Memory => "memory",
		}
	}
}

impl fmt::Display for BackingStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Rendering format for a secret value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretFormat {
	#[default]
	Json,
	Yaml,
}

impl SecretFormat {
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"json" => Some(SecretFormat::Json),
			"yaml" => Some(SecretFormat::Yaml),
			_ => None,
		}
	}

	/// Unrecognized input resolves to [`SecretFormat::Json`].
	pub fn resolve(value: &str) -> Self {
		Self::parse(value).unwrap_or_default()
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SecretFormat::Json => "json",
			SecretFormat::Yaml => "yaml",
		}
	}
}

impl fmt::Display for SecretFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Which wire request a [`SentinelCommand`] turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
	KeyDelivery,
	SecretUpsert,
	SecretDelete,
}

/// An operator command as Sentinel receives it, before defaulting.
///
/// Fields are raw operator input; [`crate::SecretUpsertRequest::from_command`]
/// applies the defaulting rules.
#[derive(Clone, Default)]
pub struct SentinelCommand {
	pub workload_id: String,
	pub secret: String,
	pub namespaces: Vec<String>,
	pub backing_store: String,
	pub use_kubernetes: bool,
	pub template: String,
	pub format: String,
	pub encrypt: bool,
	pub append_secret: bool,
	pub not_before: String,
	pub expires: String,
	pub delete_secret: bool,
	/// Newline-joined `{age secret key, age public key, AES cipher key}`.
	pub input_keys: String,
}

impl SentinelCommand {
	/// Key delivery takes precedence over everything else in the command.
	pub fn kind(&self) -> CommandKind {
		if !self.input_keys.is_empty() {
			CommandKind::KeyDelivery
		} else if self.delete_secret {
			CommandKind::SecretDelete
		} else {
			CommandKind::SecretUpsert
		}
	}
}

impl fmt::Debug for SentinelCommand {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SentinelCommand")
			.field("workload_id", &self.workload_id)
			.field("secret", &REDACTED)
			.field("namespaces", &self.namespaces)
			.field("backing_store", &self.backing_store)
			.field("use_kubernetes", &self.use_kubernetes)
			.field("template", &self.template)
			.field("format", &self.format)
			.field("encrypt", &self.encrypt)
			.field("append_secret", &self.append_secret)
			.field("not_before", &self.not_before)
			.field("expires", &self.expires)
			.field("delete_secret", &self.delete_secret)
			.field("input_keys", &REDACTED)
			.finish()
	}
}
