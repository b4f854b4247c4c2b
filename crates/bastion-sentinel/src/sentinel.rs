// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command issuing.
//!
//! Every command follows the same path:
//!
//! 1. acquire Sentinel's own identity, bounded by the acquisition timeout
//! 2. open an mTLS channel that only accepts a Safe peer
//! 3. build the request and send it
//!
//! The journal entry opened at the start is re-emitted at each decision
//! point. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use bastion_audit::{new_correlation_id, AuditEvent, Entity, Journal, JournalEntry};
use bastion_config::BastionConfig;
use bastion_identity::{
	Authorizer, IdentityAgent, IdentityGate, IdentitySource, Role, SecureChannelFactory,
};
use bastion_protocol::{
	paths, BackingStore, CommandKind, SecretUpsertRequest, SentinelCommand,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::client::{SafeClient, SafeReply};
use crate::error::SentinelResult;
use crate::generator::SecretGenerator;
use crate::request::{key_input_request, resolve_secret_value};

pub struct Sentinel {
	source: IdentitySource,
	gate: IdentityGate,
	factory: SecureChannelFactory,
	generator: Arc<dyn SecretGenerator>,
	journal: Journal,
	safe_url: Url,
	default_store: BackingStore,
	generation_prefix: String,
	acquisition_timeout: Duration,
}

impl Sentinel {
	pub fn new(
		config: &BastionConfig,
		agent: Arc<dyn IdentityAgent>,
		generator: Arc<dyn SecretGenerator>,
		journal: Journal,
	) -> Self {
		let gate = IdentityGate::from_config(config);
		Self {
			source: IdentitySource::new(agent, gate.clone(), Role::Sentinel),
			gate,
			factory: SecureChannelFactory::new(),
			generator,
			journal,
			safe_url: config.safe_endpoint_url.clone(),
			default_store: config.default_backing_store,
			generation_prefix: config.generation_prefix.clone(),
			acquisition_timeout: config.acquisition_timeout,
		}
	}

	/// Deliver keys, or upsert or delete a secret, depending on `command`.
	#[instrument(skip(self, scope, command), fields(kind = ?command.kind()))]
	pub async fn post(
		&self,
		scope: &CancellationToken,
		command: &SentinelCommand,
	) -> SentinelResult<SafeReply> {
		let (method, path) = match command.kind() {
			CommandKind::KeyDelivery => ("POST", paths::KEYS),
			CommandKind::SecretUpsert => ("POST", paths::SECRETS),
			CommandKind::SecretDelete => ("DELETE", paths::SECRETS),
		};
		let mut entry = self.open_entry(method, path);

		let outcome = async {
			let client = self.connect(scope, &mut entry).await?;
			match command.kind() {
				CommandKind::KeyDelivery => {
					let request = key_input_request(command)?;
					entry.entity = Entity::key_input(&request);
					client.post_keys(&entry.correlation_id, &request).await
				}
				kind => {
					let request = self.secret_request(command, &mut entry);
					if kind == CommandKind::SecretDelete {
						entry.entity = Entity::secret_delete(&request);
						client.delete_secret(&entry.correlation_id, &request).await
					} else {
						entry.entity = Entity::secret_upsert(&request);
						client.upsert_secret(&entry.correlation_id, &request).await
					}
				}
			}
		}
		.await;

		self.finish(entry, outcome)
	}

	/// Tell Safe the bootstrap sequence has finished.
	#[instrument(skip(self, scope))]
	pub async fn post_init_completed(&self, scope: &CancellationToken) -> SentinelResult<SafeReply> {
		let mut entry = self.open_entry("POST", paths::INIT_COMPLETED);
		entry.entity = Entity::InitComplete;

		let outcome = async {
			let client = self.connect(scope, &mut entry).await?;
			client.post_init_completed(&entry.correlation_id).await
		}
		.await;

		self.finish(entry, outcome)
	}

	/// List secrets; `reveal` asks Safe for decrypted values.
	#[instrument(skip(self, scope))]
	pub async fn list_secrets(
		&self,
		scope: &CancellationToken,
		reveal: bool,
	) -> SentinelResult<SafeReply> {
		let mut entry = self.open_entry("GET", paths::SECRETS);
		entry.entity = Entity::SecretList { reveal };

		let outcome = async {
			let client = self.connect(scope, &mut entry).await?;
			client.list_secrets(&entry.correlation_id, reveal).await
		}
		.await;

		self.finish(entry, outcome)
	}

	fn open_entry(&self, method: &str, path: &str) -> JournalEntry {
		let mut entry = JournalEntry::new(new_correlation_id(), "", method, path);
		self.journal.record(&mut entry, AuditEvent::Enter);
		entry
	}

	async fn connect(
		&self,
		scope: &CancellationToken,
		entry: &mut JournalEntry,
	) -> SentinelResult<SafeClient> {
		let handle = self
			.source
			.acquire(scope, Some(self.acquisition_timeout))
			.await?;
		entry.spiffe_id = handle.spiffe_id().to_string();

		let authorizer = Authorizer::for_role(self.gate.clone(), Role::Safe);
		let channel = self.factory.build(handle, authorizer)?;
		Ok(SafeClient::over_channel(channel, self.safe_url.clone()))
	}

	fn secret_request(
		&self,
		command: &SentinelCommand,
		entry: &mut JournalEntry,
	) -> SecretUpsertRequest {
		let resolved = resolve_secret_value(
			&command.secret,
			&self.generation_prefix,
			self.generator.as_ref(),
		);
		let request = SecretUpsertRequest::from_command(command, resolved.value, self.default_store);

		if let Some(e) = resolved.generation_error {
			warn!(error = %e, workload_id = %request.workload_id, "secret generation failed; sending placeholder");
			entry.entity = Entity::secret_upsert(&request);
			self.journal.record(entry, AuditEvent::GenerationFailure);
		}
		request
	}

	fn finish(
		&self,
		mut entry: JournalEntry,
		outcome: SentinelResult<SafeReply>,
	) -> SentinelResult<SafeReply> {
		match &outcome {
			Ok(reply) => {
				info!(status = reply.status, "command delivered");
				self.journal.record(&mut entry, AuditEvent::Ok);
			}
			Err(e) => {
				error!(error = %e, "command abandoned");
				self.journal.record(&mut entry, e.audit_event());
			}
		}
		outcome
	}
}
