// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Journal entry types.
//!
//! - [`AuditEvent`]: what happened at a decision point
//! - [`AuditSeverity`]: how loudly it should be reported
//! - [`Entity`]: redacted snapshot of the request being handled
//! - [`JournalEntry`]: one record, keyed by correlation id

use std::fmt;

use bastion_common_secret::redact_if_present;
use bastion_protocol::{BackingStore, KeyInputRequest, SecretFormat, SecretUpsertRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decision points and terminal outcomes of a protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
	/// Operation started.
	Enter,
	/// Operation completed.
	Ok,
	/// Caller or peer identity does not carry the required role.
	BadIdentity,
	/// Body unreadable, undecodable or failing field validation.
	BadPayload,
	/// The local identity agent could not supply a usable identity.
	IdentityUnavailable,
	/// Identity acquisition outlived its deadline.
	Timeout,
	/// The operation's scope ended before identity was acquired.
	Cancelled,
	/// Network or TLS failure after identity was established.
	TransportFailure,
	/// The secret generator failed; a placeholder value was sent instead.
	GenerationFailure,
	/// The outbound request could not be assembled.
	PayloadConstructionFailure,
}

impl AuditEvent {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuditEvent::Enter => "enter",
			AuditEvent::Ok => "ok",
			AuditEvent::BadIdentity => "bad_identity",
			AuditEvent::BadPayload => "bad_payload",
			AuditEvent::IdentityUnavailable => "identity_unavailable",
			AuditEvent::Timeout => "timeout",
			AuditEvent::Cancelled => "cancelled",
			AuditEvent::TransportFailure => "transport_failure",
			AuditEvent::GenerationFailure => "generation_failure",
			AuditEvent::PayloadConstructionFailure => "payload_construction_failure",
		}
	}

	pub fn severity(&self) -> AuditSeverity {
		match self {
			AuditEvent::Enter | AuditEvent::Ok => AuditSeverity::Info,
			AuditEvent::Cancelled => AuditSeverity::Notice,
			AuditEvent::BadIdentity | AuditEvent::BadPayload | AuditEvent::GenerationFailure => {
				AuditSeverity::Warning
			}
			AuditEvent::IdentityUnavailable
			| AuditEvent::Timeout
			| AuditEvent::TransportFailure
			| AuditEvent::PayloadConstructionFailure => AuditSeverity::Error,
		}
	}

	/// `false` only for [`AuditEvent::Enter`] and [`AuditEvent::GenerationFailure`],
	/// after which the operation carries on.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, AuditEvent::Enter | AuditEvent::GenerationFailure)
	}
}

impl fmt::Display for AuditEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Info,
	Notice,
	Warning,
	Error,
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
		};
		f.write_str(s)
	}
}

/// Key-delivery body with every fragment redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInputSnapshot {
	pub age_secret_key: String,
	pub age_public_key: String,
	pub aes_cipher_key: String,
}

impl From<&KeyInputRequest> for KeyInputSnapshot {
	fn from(request: &KeyInputRequest) -> Self {
		Self {
			age_secret_key: redact_if_present(&request.age_secret_key),
			age_public_key: redact_if_present(&request.age_public_key),
			aes_cipher_key: redact_if_present(&request.aes_cipher_key),
		}
	}
}

/// Upsert/delete body with the secret value redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSnapshot {
	pub workload_id: String,
	pub value: String,
	pub namespaces: Vec<String>,
	pub backing_store: BackingStore,
	pub use_kubernetes: bool,
	pub template: String,
	pub format: SecretFormat,
	pub encrypt: bool,
	pub append_value: bool,
	pub not_before: String,
	pub expires: String,
}

impl From<&SecretUpsertRequest> for SecretSnapshot {
	fn from(request: &SecretUpsertRequest) -> Self {
		Self {
			workload_id: request.workload_id.clone(),
			value: redact_if_present(&request.value),
			namespaces: request.namespaces.clone(),
			backing_store: request.backing_store,
			use_kubernetes: request.use_kubernetes,
			template: request.template.clone(),
			format: request.format,
			encrypt: request.encrypt,
			append_value: request.append_value,
			not_before: request.not_before.clone(),
			expires: request.expires.clone(),
		}
	}
}

/// The request a journal entry is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
	#[default]
	Empty,
	KeyInput(KeyInputSnapshot),
	SecretUpsert(SecretSnapshot),
	SecretDelete(SecretSnapshot),
	InitComplete,
	SecretList { reveal: bool },
}

impl Entity {
	pub fn key_input(request: &KeyInputRequest) -> Self {
		Entity::KeyInput(request.into())
	}

	pub fn secret_upsert(request: &SecretUpsertRequest) -> Self {
		Entity::SecretUpsert(request.into())
	}

	pub fn secret_delete(request: &SecretUpsertRequest) -> Self {
		Entity::SecretDelete(request.into())
	}
}

/// Fresh opaque correlation id.
pub fn new_correlation_id() -> String {
	Uuid::new_v4().to_string()
}

/// One audit record.
///
/// Created with [`AuditEvent::Enter`] and an empty entity when an operation
/// starts, then re-emitted with an updated event (and entity, once known)
/// at every decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
	pub correlation_id: String,
	pub spiffe_id: String,
	pub method: String,
	pub path: String,
	pub event: AuditEvent,
	pub entity: Entity,
	pub timestamp: DateTime<Utc>,
}

impl JournalEntry {
	pub fn new(
		correlation_id: impl Into<String>,
		spiffe_id: impl Into<String>,
		method: impl Into<String>,
		path: impl Into<String>,
	) -> Self {
		Self {
			correlation_id: correlation_id.into(),
			spiffe_id: spiffe_id.into(),
			method: method.into(),
			path: path.into(),
			event: AuditEvent::Enter,
			entity: Entity::Empty,
			timestamp: Utc::now(),
		}
	}

	pub fn with_entity(mut self, entity: Entity) -> Self {
		self.entity = entity;
		self
	}

	pub fn severity(&self) -> AuditSeverity {
		self.event.severity()
	}
}
