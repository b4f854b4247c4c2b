// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use bastion_audit::AuditEvent;
use bastion_identity::IdentityError;
use bastion_protocol::KeyTripleError;
use thiserror::Error;

pub type SentinelResult<T> = Result<T, SentinelError>;

#[derive(Debug, Error)]
pub enum SentinelError {
	#[error(transparent)]
	Identity(#[from] IdentityError),

	#[error("cannot build key delivery: {0}")]
	KeyTriple(#[from] KeyTripleError),

	#[error("request to Safe failed: {0}")]
	Transport(#[from] reqwest::Error),
}

impl SentinelError {
	/// The journal event recorded when a command ends with this error.
	pub fn audit_event(&self) -> AuditEvent {
		match self {
			SentinelError::Identity(IdentityError::Timeout(_)) => AuditEvent::Timeout,
			SentinelError::Identity(IdentityError::Cancelled) => AuditEvent::Cancelled,
			SentinelError::Identity(IdentityError::Channel(_)) => AuditEvent::TransportFailure,
			SentinelError::Identity(_) => AuditEvent::IdentityUnavailable,
			SentinelError::KeyTriple(_) => AuditEvent::PayloadConstructionFailure,
			SentinelError::Transport(_) => AuditEvent::TransportFailure,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bastion_identity::Role;
	use std::time::Duration;

	#[test]
	fn identity_failures_map_by_kind() {
		let cases = [
			(IdentityError::Timeout(Duration::from_secs(1)), AuditEvent::Timeout),
			(IdentityError::Cancelled, AuditEvent::Cancelled),
			(
				IdentityError::Channel("bad key".into()),
				AuditEvent::TransportFailure,
			),
			(
				IdentityError::NoIdentity("empty".into()),
				AuditEvent::IdentityUnavailable,
			),
			(
				IdentityError::UnexpectedIdentity {
					spiffe_id: "spiffe://x".into(),
					expected: Role::Sentinel,
				},
				AuditEvent::IdentityUnavailable,
			),
		];

		for (error, expected) in cases {
			assert_eq!(SentinelError::from(error).audit_event(), expected);
		}
	}

	#[test]
	fn malformed_triple_is_payload_construction_failure() {
		let error = SentinelError::from(KeyTripleError::WrongPartCount(2));
		assert_eq!(error.audit_event(), AuditEvent::PayloadConstructionFailure);
		assert_eq!(
			error.to_string(),
			"cannot build key delivery: expected 3 newline-separated key fragments, got 2"
		);
	}
}
