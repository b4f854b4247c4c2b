// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Master-key delivery.
//!
//! Endpoint:
//! - `POST /sentinel/v1/keys` - Deliver the three master-key fragments
//!
//! Checked in order, each failure ending the request:
//!
//! 1. the caller is a Sentinel (`401`, [`AuditEvent::BadIdentity`])
//! 2. the body can be read (`400`, [`AuditEvent::BadPayload`])
//! 3. the body decodes as a [`KeyInputRequest`] (`400`, `BadPayload`)
//! 4. every fragment is non-empty after trimming (`400`, `BadPayload`)
//!
//! On success the joined key is handed to the custodian and the response
//! body is `OK`.

use axum::{
	body::Body,
	extract::{Request, State},
	http::StatusCode,
	response::{IntoResponse, Response},
};
use bastion_audit::{AuditEvent, Entity, JournalEntry};
use bastion_protocol::{paths, KeyInputRequest, KeyTriple};
use tracing::{info, instrument, warn};

use crate::api::AppState;
use crate::error::{SafeError, SafeResult};
use crate::peer::{correlation_id, PeerIdentity};

/// Upper bound on a key-delivery body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[instrument(skip_all, fields(correlation_id, spiffe_id))]
pub async fn receive_keys(State(state): State<AppState>, request: Request) -> Response {
	let correlation_id = correlation_id(request.headers());
	let spiffe_id = request
		.extensions()
		.get::<PeerIdentity>()
		.map(|peer| peer.as_str().to_string())
		.unwrap_or_default();

	let span = tracing::Span::current();
	span.record("correlation_id", correlation_id.as_str());
	span.record("spiffe_id", spiffe_id.as_str());

	let mut entry = JournalEntry::new(correlation_id, spiffe_id.clone(), "POST", paths::KEYS);
	state.journal.record(&mut entry, AuditEvent::Enter);

	match accept_keys(&state, &spiffe_id, request.into_body(), &mut entry).await {
		Ok(()) => {
			state.journal.record(&mut entry, AuditEvent::Ok);
			(StatusCode::OK, "OK").into_response()
		}
		Err(e) => {
			warn!(error = %e, "rejected key delivery");
			state.journal.record(&mut entry, e.audit_event());
			e.into_response()
		}
	}
}

async fn accept_keys(
	state: &AppState,
	spiffe_id: &str,
	body: Body,
	entry: &mut JournalEntry,
) -> SafeResult<()> {
	if !state.gate.is_sentinel(spiffe_id) {
		return Err(SafeError::BadIdentity {
			spiffe_id: spiffe_id.to_string(),
		});
	}

	let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
		.await
		.map_err(|e| SafeError::BadPayload(format!("unreadable body: {e}")))?;

	// serde_json messages can quote input, so only the position is kept.
	let request: KeyInputRequest = serde_json::from_slice(&bytes).map_err(|e| {
		SafeError::BadPayload(format!(
			"undecodable body ({:?} error at line {} column {})",
			e.classify(),
			e.line(),
			e.column()
		))
	})?;
	entry.entity = Entity::key_input(&request);

	let triple =
		KeyTriple::from_request(&request).map_err(|e| SafeError::BadPayload(e.to_string()))?;

	state.custodian.set_master_key(triple.join()).await;
	info!("master key delivered");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::create_router;
	use crate::custodian::MasterKeyCustodian;
	use crate::peer::CORRELATION_ID_HEADER;
	use async_trait::async_trait;
	use bastion_audit::{AuditFilter, AuditSink, AuditSinkError, Journal};
	use bastion_common_secret::REDACTED;
	use bastion_identity::IdentityGate;
	use proptest::prelude::*;
	use std::sync::{Arc, Mutex};
	use tokio::time::{sleep, Duration};
	use tower::ServiceExt;

	const SENTINEL: &str = "spiffe://bastion.dev/workload/bastion-sentinel/n/";
	const SAFE: &str = "spiffe://bastion.dev/workload/bastion-safe/n/";

	#[derive(Default)]
	struct RecordingSink {
		filter: AuditFilter,
		entries: Mutex<Vec<JournalEntry>>,
	}

	#[async_trait]
	impl AuditSink for RecordingSink {
		fn name(&self) -> &str {
			"recording"
		}

		fn filter(&self) -> &AuditFilter {
			&self.filter
		}

		async fn publish(&self, entry: Arc<JournalEntry>) -> Result<(), AuditSinkError> {
			self.entries.lock().unwrap().push(entry.as_ref().clone());
			Ok(())
		}
	}

	struct Harness {
		custodian: MasterKeyCustodian,
		sink: Arc<RecordingSink>,
		state: AppState,
	}

	impl Harness {
		fn new() -> Self {
			let custodian = MasterKeyCustodian::new();
			let sink = Arc::new(RecordingSink::default());
			let state = AppState {
				custodian: custodian.clone(),
				gate: IdentityGate::new(SENTINEL, SAFE, "spiffe://bastion.dev/workload/"),
				journal: Journal::new(64, vec![sink.clone()]),
			};
			Self {
				custodian,
				sink,
				state,
			}
		}

		async fn post(&self, peer: Option<&str>, body: &str) -> (StatusCode, String) {
			let mut request = axum::http::Request::builder()
				.method("POST")
				.uri(paths::KEYS)
				.header("content-type", "application/json")
				.header(CORRELATION_ID_HEADER, "cid-1")
				.body(Body::from(body.to_string()))
				.unwrap();
			if let Some(peer) = peer {
				request
					.extensions_mut()
					.insert(PeerIdentity(peer.to_string()));
			}

			let response = create_router(self.state.clone())
				.oneshot(request)
				.await
				.unwrap();
			let status = response.status();
			let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
				.await
				.unwrap();
			(status, String::from_utf8(bytes.to_vec()).unwrap())
		}

		async fn journal(&self) -> Vec<JournalEntry> {
			sleep(Duration::from_millis(50)).await;
			self.sink.entries.lock().unwrap().clone()
		}

		async fn events(&self) -> Vec<AuditEvent> {
			self.journal().await.iter().map(|e| e.event).collect()
		}
	}

	fn sentinel() -> String {
		format!("{SENTINEL}node-1")
	}

	#[tokio::test]
	async fn authorized_delivery_sets_master_key() {
		let harness = Harness::new();
		let (status, body) = harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":"sk1","AgePublicKey":"pk1","AesCipherKey":"ck1"}"#,
			)
			.await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, "OK");
		assert_eq!(
			harness.custodian.master_key().await.unwrap().expose(),
			"sk1\npk1\nck1"
		);
		assert_eq!(
			harness.events().await,
			vec![AuditEvent::Enter, AuditEvent::Ok]
		);
	}

	#[tokio::test]
	async fn fragments_are_trimmed() {
		let harness = Harness::new();
		let (status, _) = harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":" sk1\n","AgePublicKey":"\tpk1","AesCipherKey":"ck1  "}"#,
			)
			.await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(
			harness.custodian.master_key().await.unwrap().expose(),
			"sk1\npk1\nck1"
		);
	}

	#[tokio::test]
	async fn non_sentinel_is_rejected_before_decoding() {
		let harness = Harness::new();
		let (status, body) = harness
			.post(Some(&format!("{SAFE}node-1")), "this is not json")
			.await;

		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert!(body.is_empty());
		assert!(!harness.custodian.is_set().await);

		let journal = harness.journal().await;
		assert_eq!(
			journal.iter().map(|e| e.event).collect::<Vec<_>>(),
			vec![AuditEvent::Enter, AuditEvent::BadIdentity]
		);
		assert_eq!(journal[1].entity, Entity::Empty);
	}

	#[tokio::test]
	async fn missing_peer_identity_is_rejected() {
		let harness = Harness::new();
		let (status, _) = harness
			.post(None, r#"{"AgeSecretKey":"sk1","AgePublicKey":"pk1","AesCipherKey":"ck1"}"#)
			.await;

		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert!(!harness.custodian.is_set().await);
	}

	#[tokio::test]
	async fn undecodable_body_is_bad_payload() {
		let harness = Harness::new();
		let (status, body) = harness.post(Some(&sentinel()), "{not json").await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body.is_empty());
		assert_eq!(
			harness.events().await,
			vec![AuditEvent::Enter, AuditEvent::BadPayload]
		);
	}

	#[tokio::test]
	async fn oversized_body_is_bad_payload() {
		let harness = Harness::new();
		let body = format!(
			r#"{{"AgeSecretKey":"{}","AgePublicKey":"pk1","AesCipherKey":"ck1"}}"#,
			"a".repeat(MAX_BODY_BYTES + 10)
		);
		let (status, response) = harness.post(Some(&sentinel()), &body).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(response.is_empty());
		assert!(!harness.custodian.is_set().await);
		assert_eq!(
			harness.events().await,
			vec![AuditEvent::Enter, AuditEvent::BadPayload]
		);
	}

	#[tokio::test]
	async fn empty_fragment_is_bad_payload_and_keeps_existing_key() {
		let harness = Harness::new();
		harness.custodian.set_master_key("previous".into()).await;

		let (status, _) = harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":"sk1","AgePublicKey":"   ","AesCipherKey":"ck1"}"#,
			)
			.await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(
			harness.custodian.master_key().await.unwrap().expose(),
			"previous"
		);
	}

	#[tokio::test]
	async fn journal_snapshot_is_redacted() {
		let harness = Harness::new();
		harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":"sk1","AgePublicKey":"","AesCipherKey":"ck1"}"#,
			)
			.await;

		let journal = harness.journal().await;
		let last = journal.last().unwrap();
		assert_eq!(last.event, AuditEvent::BadPayload);
		assert_eq!(last.correlation_id, "cid-1");
		assert_eq!(last.spiffe_id, sentinel());
		let Entity::KeyInput(snapshot) = &last.entity else {
			panic!("expected key input snapshot, got {:?}", last.entity);
		};
		assert_eq!(snapshot.age_secret_key, REDACTED);
		assert_eq!(snapshot.age_public_key, "");
		assert_eq!(snapshot.aes_cipher_key, REDACTED);
	}

	#[tokio::test]
	async fn redelivery_replaces_key() {
		let harness = Harness::new();
		harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":"sk1","AgePublicKey":"pk1","AesCipherKey":"ck1"}"#,
			)
			.await;
		let (status, _) = harness
			.post(
				Some(&sentinel()),
				r#"{"AgeSecretKey":"sk2","AgePublicKey":"pk2","AesCipherKey":"ck2"}"#,
			)
			.await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(
			harness.custodian.master_key().await.unwrap().expose(),
			"sk2\npk2\nck2"
		);
	}

	fn fragment() -> impl Strategy<Value = String> {
		"[A-Za-z0-9+/=-]{1,24}"
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(32))]

		#[test]
		fn valid_fragments_join_exactly(sk in fragment(), pk in fragment(), ck in fragment()) {
			let key = tokio_test::block_on(async {
				let harness = Harness::new();
				let body = serde_json::json!({
					"AgeSecretKey": sk,
					"AgePublicKey": pk,
					"AesCipherKey": ck,
				});
				let (status, _) = harness.post(Some(&sentinel()), &body.to_string()).await;
				assert_eq!(status, StatusCode::OK);
				harness.custodian.master_key().await
			});
			let key = key.unwrap();
			prop_assert_eq!(key.expose(), &format!("{sk}\n{pk}\n{ck}"));
		}

		#[test]
		fn blank_fragment_never_reaches_custodian(
			blank in "[ \t\n]{0,4}",
			slot in 0usize..3,
			other in fragment(),
		) {
			let set = tokio_test::block_on(async {
				let harness = Harness::new();
				let mut fields = [other.clone(), other.clone(), other.clone()];
				fields[slot] = blank.clone();
				let body = serde_json::json!({
					"AgeSecretKey": fields[0],
					"AgePublicKey": fields[1],
					"AesCipherKey": fields[2],
				});
				let (status, _) = harness.post(Some(&sentinel()), &body.to_string()).await;
				assert_eq!(status, StatusCode::BAD_REQUEST);
				harness.custodian.is_set().await
			});
			prop_assert!(!set);
		}
	}
}
