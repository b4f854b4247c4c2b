// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded acquisition of this process's identity.
//!
//! The agent is contacted from a worker task. The worker reports exactly
//! once, carrying either the acquired identity or the reason it failed. The
//! caller waits for that report, the cancellation of its scope, or the
//! deadline, whichever comes first. A report that arrives after the caller
//! gave up is dropped and the identity it carried is released.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::agent::IdentityAgent;
use crate::error::{IdentityError, IdentityResult};
use crate::gate::{IdentityGate, Role};
use crate::svid::X509Svid;

/// An acquired identity. Released when dropped.
#[derive(Debug)]
pub struct IdentityHandle {
	svid: X509Svid,
}

impl IdentityHandle {
	pub fn new(svid: X509Svid) -> Self {
		Self { svid }
	}

	pub fn spiffe_id(&self) -> &str {
		self.svid.spiffe_id()
	}

	pub fn svid(&self) -> &X509Svid {
		&self.svid
	}
}

impl Drop for IdentityHandle {
	fn drop(&mut self) {
		debug!(spiffe_id = %self.svid.spiffe_id(), "released identity");
	}
}

/// Acquires an identity that must carry `expected_role`.
#[derive(Clone)]
pub struct IdentitySource {
	agent: Arc<dyn IdentityAgent>,
	gate: IdentityGate,
	expected_role: Role,
}

impl IdentitySource {
	pub fn new(agent: Arc<dyn IdentityAgent>, gate: IdentityGate, expected_role: Role) -> Self {
		Self {
			agent,
			gate,
			expected_role,
		}
	}

	pub fn expected_role(&self) -> Role {
		self.expected_role
	}

	/// Acquire the identity, giving up when `scope` is cancelled or
	/// `timeout` elapses. `None` waits indefinitely.
	#[instrument(skip(self, scope), fields(agent = %self.agent.address(), expected_role = %self.expected_role))]
	pub async fn acquire(
		&self,
		scope: &CancellationToken,
		timeout: Option<Duration>,
	) -> IdentityResult<IdentityHandle> {
		let (report_tx, report_rx) = oneshot::channel::<IdentityResult<IdentityHandle>>();

		let agent = Arc::clone(&self.agent);
		let gate = self.gate.clone();
		let role = self.expected_role;
		let worker = tokio::spawn(async move {
			let outcome = fetch_and_check(agent.as_ref(), &gate, role).await;
			if let Err(Ok(late)) = report_tx.send(outcome) {
				debug!(spiffe_id = %late.spiffe_id(), "caller stopped waiting; discarding late identity");
			}
		});

		let deadline = async move {
			match timeout {
				Some(limit) => {
					tokio::time::sleep(limit).await;
					limit
				}
				None => std::future::pending().await,
			}
		};

		let outcome = tokio::select! {
			report = report_rx => report.unwrap_or(Err(IdentityError::WorkerLost)),
			_ = scope.cancelled() => {
				worker.abort();
				Err(IdentityError::Cancelled)
			}
			limit = deadline => {
				worker.abort();
				Err(IdentityError::Timeout(limit))
			}
		};

		match &outcome {
			Ok(handle) => debug!(spiffe_id = %handle.spiffe_id(), "identity acquired"),
			Err(e) => warn!(error = %e, "identity acquisition failed"),
		}
		outcome
	}
}

async fn fetch_and_check(
	agent: &dyn IdentityAgent,
	gate: &IdentityGate,
	role: Role,
) -> IdentityResult<IdentityHandle> {
	let svid = agent.fetch_x509_svid().await?;
	if !gate.has_role(svid.spiffe_id(), role) {
		return Err(IdentityError::UnexpectedIdentity {
			spiffe_id: svid.spiffe_id().to_string(),
			expected: role,
		});
	}
	Ok(IdentityHandle::new(svid))
}
