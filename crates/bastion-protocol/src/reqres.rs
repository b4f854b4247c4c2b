// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON request bodies exchanged between Sentinel and Safe.

use std::fmt;

use bastion_common_secret::REDACTED;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::data::{BackingStore, SecretFormat, SentinelCommand};

/// `notBefore` value used when the operator supplies none.
pub const NOT_BEFORE_NOW: &str = "now";

/// `expires` value used when the operator supplies none.
pub const EXPIRES_NEVER: &str = "never";

/// Body of `POST /sentinel/v1/keys`.
///
/// Missing fields decode as empty strings; Safe rejects them during field
/// validation rather than while decoding.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyInputRequest {
	#[serde(default, rename = "AgeSecretKey", alias = "ageSecretKey")]
	pub age_secret_key: String,
	#[serde(default, rename = "AgePublicKey", alias = "agePublicKey")]
	pub age_public_key: String,
	#[serde(default, rename = "AesCipherKey", alias = "aesCipherKey")]
	pub aes_cipher_key: String,
}

impl fmt::Debug for KeyInputRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KeyInputRequest")
			.field("age_secret_key", &REDACTED)
			.field("age_public_key", &REDACTED)
			.field("aes_cipher_key", &REDACTED)
			.finish()
	}
}

/// Body of `POST` and `DELETE /sentinel/v1/secrets`. Deletion reuses the
/// upsert shape; only the HTTP verb differs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretUpsertRequest {
	#[serde(rename = "key")]
	pub workload_id: String,
	pub value: String,
	pub namespaces: Vec<String>,
	#[serde(rename = "store")]
	pub backing_store: BackingStore,
	pub use_kubernetes: bool,
	pub template: String,
	pub format: SecretFormat,
	pub encrypt: bool,
	pub append_value: bool,
	pub not_before: String,
	pub expires: String,
}

impl SecretUpsertRequest {
	/// Build the wire request from an operator command.
	///
	/// `value` is the final secret value (after any pattern generation).
	/// Unrecognized backing stores resolve to `default_store`, unrecognized
	/// formats to JSON, and empty validity bounds to `now` / `never`.
	pub fn from_command(
		command: &SentinelCommand,
		value: String,
		default_store: BackingStore,
	) -> Self {
		let not_before = if command.not_before.is_empty() {
			NOT_BEFORE_NOW.to_string()
		} else {
			command.not_before.clone()
		};

		let expires = if command.expires.is_empty() {
			EXPIRES_NEVER.to_string()
		} else {
			command.expires.clone()
		};

		Self {
			workload_id: command.workload_id.clone(),
			value,
			namespaces: command.namespaces.clone(),
			backing_store: BackingStore::resolve(&command.backing_store, default_store),
			use_kubernetes: command.use_kubernetes,
			template: command.template.clone(),
			format: SecretFormat::resolve(&command.format),
			encrypt: command.encrypt,
			append_value: command.append_secret,
			not_before,
			expires,
		}
	}
}

impl fmt::Debug for SecretUpsertRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretUpsertRequest")
			.field("workload_id", &self.workload_id)
			.field("value", &REDACTED)
			.field("namespaces", &self.namespaces)
			.field("backing_store", &self.backing_store)
			.field("use_kubernetes", &self.use_kubernetes)
			.field("template", &self.template)
			.field("format", &self.format)
			.field("encrypt", &self.encrypt)
			.field("append_value", &self.append_value)
			.field("not_before", &self.not_before)
			.field("expires", &self.expires)
			.finish()
	}
}

/// Body of `POST /sentinel/v1/init-completed`. Serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelInitCompleteRequest {}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn key_input_uses_documented_field_names() {
		let request = KeyInputRequest {
			age_secret_key: "sk1".into(),
			age_public_key: "pk1".into(),
			aes_cipher_key: "ck1".into(),
		};
		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({"AgeSecretKey": "sk1", "AgePublicKey": "pk1", "AesCipherKey": "ck1"})
		);
	}

	#[test]
	fn key_input_missing_fields_decode_empty() {
		let request: KeyInputRequest =
			serde_json::from_str(r#"{"AgeSecretKey": "sk1"}"#).unwrap();
		assert_eq!(request.age_secret_key, "sk1");
		assert!(request.age_public_key.is_empty());
		assert!(request.aes_cipher_key.is_empty());
	}

	#[test]
	fn key_input_debug_is_redacted() {
		let request = KeyInputRequest {
			age_secret_key: "AGE-SECRET-KEY-1XYZ".into(),
			age_public_key: String::new(),
			aes_cipher_key: String::new(),
		};
		assert!(!format!("{request:?}").contains("AGE-SECRET-KEY"));
	}

	#[test]
	fn upsert_applies_defaults() {
		let command = SentinelCommand {
			workload_id: "billing".into(),
			backing_store: "s3".into(),
			format: "toml".into(),
			..Default::default()
		};
		let request =
			SecretUpsertRequest::from_command(&command, "v".into(), BackingStore::Memory);

		assert_eq!(request.backing_store, BackingStore::Memory);
		assert_eq!(request.format, SecretFormat::Json);
		assert_eq!(request.not_before, NOT_BEFORE_NOW);
		assert_eq!(request.expires, EXPIRES_NEVER);
	}

	#[test]
	fn upsert_keeps_explicit_values() {
		let command = SentinelCommand {
			workload_id: "billing".into(),
			namespaces: vec!["default".into(), "payments".into()],
			backing_store: "file".into(),
			format: "yaml".into(),
			template: "{{.user}}".into(),
			use_kubernetes: true,
			encrypt: true,
			append_secret: true,
			not_before: "2026-01-01T00:00:00Z".into(),
			expires: "2027-01-01T00:00:00Z".into(),
			..Default::default()
		};
		let request =
			SecretUpsertRequest::from_command(&command, "v".into(), BackingStore::Memory);

		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({
				"key": "billing",
				"value": "v",
				"namespaces": ["default", "payments"],
				"store": "file",
				"useKubernetes": true,
				"template": "{{.user}}",
				"format": "yaml",
				"encrypt": true,
				"appendValue": true,
				"notBefore": "2026-01-01T00:00:00Z",
				"expires": "2027-01-01T00:00:00Z",
			})
		);
	}

	#[test]
	fn init_complete_is_empty_object() {
		assert_eq!(
			serde_json::to_string(&SentinelInitCompleteRequest::default()).unwrap(),
			"{}"
		);
	}

	proptest! {
		#[test]
		fn non_empty_bounds_pass_through(not_before in "\\PC{1,24}", expires in "\\PC{1,24}") {
			let command = SentinelCommand {
				not_before: not_before.clone(),
				expires: expires.clone(),
				..Default::default()
			};
			let request = SecretUpsertRequest::from_command(&command, String::new(), BackingStore::File);
			prop_assert_eq!(request.not_before, not_before);
			prop_assert_eq!(request.expires, expires);
		}
	}
}
