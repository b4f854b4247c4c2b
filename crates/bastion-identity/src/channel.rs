// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mutually authenticated HTTP channels.
//!
//! The client presents its own SVID and accepts a server only when:
//!
//! 1. the server's chain verifies against our trust bundle, and
//! 2. the SPIFFE ID in the server's leaf passes the [`Authorizer`].
//!
//! Hostname verification is replaced by step 2.

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::gate::{IdentityGate, Role};
use crate::source::IdentityHandle;
use crate::svid::spiffe_id_from_der;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unexpected peer identity '{spiffe_id}': expected {expected}")]
pub struct AuthorizationError {
	pub spiffe_id: String,
	pub expected: Role,
}

/// Decides whether a verified peer SPIFFE ID may be talked to.
#[derive(Debug, Clone)]
pub struct Authorizer {
	gate: IdentityGate,
	role: Role,
}

impl Authorizer {
	/// Accept only peers carrying `role`.
	pub fn for_role(gate: IdentityGate, role: Role) -> Self {
		Self { gate, role }
	}

	pub fn role(&self) -> Role {
		self.role
	}

	pub fn authorize(&self, spiffe_id: &str) -> Result<(), AuthorizationError> {
		if self.gate.has_role(spiffe_id, self.role) {
			Ok(())
		} else {
			Err(AuthorizationError {
				spiffe_id: spiffe_id.to_string(),
				expected: self.role,
			})
		}
	}
}

/// Builds [`SecureChannel`]s from acquired identities.
#[derive(Clone)]
pub struct SecureChannelFactory {
	provider: Arc<CryptoProvider>,
}

impl Default for SecureChannelFactory {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for SecureChannelFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecureChannelFactory").finish_non_exhaustive()
	}
}

impl SecureChannelFactory {
	pub fn new() -> Self {
		Self {
			provider: Arc::new(rustls::crypto::ring::default_provider()),
		}
	}

	/// TLS settings that present `handle`'s SVID and check the server with
	/// `authorizer`.
	pub fn client_config(
		&self,
		handle: &IdentityHandle,
		authorizer: Authorizer,
	) -> IdentityResult<ClientConfig> {
		let svid = handle.svid();

		let mut roots = RootCertStore::empty();
		for anchor in svid.bundle() {
			roots
				.add(anchor.clone())
				.map_err(|e| IdentityError::Channel(format!("trust bundle: {e}")))?;
		}

		let verifier = SpiffeServerVerifier {
			roots,
			authorizer,
			provider: Arc::clone(&self.provider),
		};

		ClientConfig::builder_with_provider(Arc::clone(&self.provider))
			.with_safe_default_protocol_versions()
			.map_err(|e| IdentityError::Channel(e.to_string()))?
			.dangerous()
			.with_custom_certificate_verifier(Arc::new(verifier))
			.with_client_auth_cert(svid.cert_chain().to_vec(), svid.private_key().clone_key())
			.map_err(|e| IdentityError::Channel(format!("client certificate: {e}")))
	}

	/// Wrap `handle` in an HTTP client. The channel keeps the identity
	/// alive and releases it when dropped.
	#[instrument(skip_all, fields(spiffe_id = %handle.spiffe_id(), peer_role = %authorizer.role()))]
	pub fn build(
		&self,
		handle: IdentityHandle,
		authorizer: Authorizer,
	) -> IdentityResult<SecureChannel> {
		let tls = self.client_config(&handle, authorizer)?;
		let client = reqwest::Client::builder()
			.use_preconfigured_tls(tls)
			.build()
			.map_err(|e| IdentityError::Channel(e.to_string()))?;

		Ok(SecureChannel { client, handle })
	}
}

/// An HTTP client bound to the identity it authenticates with.
#[derive(Debug)]
pub struct SecureChannel {
	client: reqwest::Client,
	handle: IdentityHandle,
}

impl SecureChannel {
	pub fn client(&self) -> &reqwest::Client {
		&self.client
	}

	pub fn local_spiffe_id(&self) -> &str {
		self.handle.spiffe_id()
	}
}

struct SpiffeServerVerifier {
	roots: RootCertStore,
	authorizer: Authorizer,
	provider: Arc<CryptoProvider>,
}

impl fmt::Debug for SpiffeServerVerifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SpiffeServerVerifier")
			.field("roots", &self.roots.len())
			.field("authorizer", &self.authorizer)
			.finish()
	}
}

impl ServerCertVerifier for SpiffeServerVerifier {
	fn verify_server_cert(
		&self,
		end_entity: &CertificateDer<'_>,
		intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		now: UnixTime,
	) -> Result<ServerCertVerified, rustls::Error> {
		let cert = ParsedCertificate::try_from(end_entity)?;
		verify_server_cert_signed_by_trust_anchor(
			&cert,
			&self.roots,
			intermediates,
			now,
			self.provider.signature_verification_algorithms.all,
		)?;

		let spiffe_id = spiffe_id_from_der(end_entity.as_ref())
			.map_err(|e| rustls::Error::General(e.to_string()))?;
		self.authorizer.authorize(&spiffe_id).map_err(|e| {
			warn!(peer = %spiffe_id, expected = %e.expected, "rejected peer identity");
			rustls::Error::General(e.to_string())
		})?;

		Ok(ServerCertVerified::assertion())
	}

	fn verify_tls12_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		verify_tls12_signature(
			message,
			cert,
			dss,
			&self.provider.signature_verification_algorithms,
		)
	}

	fn verify_tls13_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		verify_tls13_signature(
			message,
			cert,
			dss,
			&self.provider.signature_verification_algorithms,
		)
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		self.provider
			.signature_verification_algorithms
			.supported_schemes()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::TestPki;

	const SENTINEL: &str = "spiffe://bastion.dev/workload/bastion-sentinel/n/";
	const SAFE: &str = "spiffe://bastion.dev/workload/bastion-safe/n/";

	fn gate() -> IdentityGate {
		IdentityGate::new(SENTINEL, SAFE, "spiffe://bastion.dev/workload/")
	}

	fn verifier_trusting(pki: &TestPki) -> SpiffeServerVerifier {
		let bundle = pki.issue(&[&format!("{SENTINEL}client")]).to_svid();
		let mut roots = RootCertStore::empty();
		for anchor in bundle.bundle() {
			roots.add(anchor.clone()).unwrap();
		}
		SpiffeServerVerifier {
			roots,
			authorizer: Authorizer::for_role(gate(), Role::Safe),
			provider: Arc::new(rustls::crypto::ring::default_provider()),
		}
	}

	fn verify(verifier: &SpiffeServerVerifier, server_der: Vec<u8>) -> Result<(), rustls::Error> {
		let server_name = ServerName::try_from("bastion-safe.local").unwrap();
		verifier
			.verify_server_cert(
				&CertificateDer::from(server_der),
				&[],
				&server_name,
				&[],
				UnixTime::now(),
			)
			.map(|_| ())
	}

	#[test]
	fn authorizer_accepts_expected_role() {
		let authorizer = Authorizer::for_role(gate(), Role::Safe);
		assert!(authorizer.authorize(&format!("{SAFE}node-1")).is_ok());
	}

	#[test]
	fn authorizer_rejection_names_peer() {
		let authorizer = Authorizer::for_role(gate(), Role::Safe);
		let err = authorizer
			.authorize("spiffe://bastion.dev/workload/intruder")
			.unwrap_err();
		assert_eq!(
			err.to_string(),
			"unexpected peer identity 'spiffe://bastion.dev/workload/intruder': expected safe"
		);
	}

	#[test]
	fn accepts_trusted_safe_server() {
		let pki = TestPki::new();
		let verifier = verifier_trusting(&pki);
		let server = pki.issue(&[&format!("{SAFE}node-1")]);
		verify(&verifier, server.cert_der).unwrap();
	}

	#[test]
	fn rejects_trusted_server_with_wrong_identity() {
		let pki = TestPki::new();
		let verifier = verifier_trusting(&pki);
		let server = pki.issue(&[&format!("{SENTINEL}impostor")]);

		let err = verify(&verifier, server.cert_der).unwrap_err();
		assert!(err.to_string().contains("unexpected peer identity"));
		assert!(err.to_string().contains("impostor"));
	}

	#[test]
	fn rejects_server_from_foreign_trust_domain() {
		let verifier = verifier_trusting(&TestPki::new());
		let foreign = TestPki::new().issue(&[&format!("{SAFE}node-1")]);
		assert!(verify(&verifier, foreign.cert_der).is_err());
	}

	fn server_config(pki: &TestPki, server_id: &str) -> rustls::ServerConfig {
		let provider = Arc::new(rustls::crypto::ring::default_provider());
		let server = pki.issue(&[server_id]).to_svid();

		let mut roots = RootCertStore::empty();
		for anchor in server.bundle() {
			roots.add(anchor.clone()).unwrap();
		}
		let client_verifier =
			rustls::server::WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
				.build()
				.unwrap();

		rustls::ServerConfig::builder_with_provider(provider)
			.with_safe_default_protocol_versions()
			.unwrap()
			.with_client_cert_verifier(client_verifier)
			.with_single_cert(server.cert_chain().to_vec(), server.private_key().clone_key())
			.unwrap()
	}

	fn pump(from: &mut rustls::Connection, to: &mut rustls::Connection) -> Result<(), rustls::Error> {
		let mut wire = Vec::new();
		while from.wants_write() {
			from.write_tls(&mut wire).unwrap();
		}
		let mut pending = &wire[..];
		while !pending.is_empty() {
			to.read_tls(&mut pending).unwrap();
			to.process_new_packets()?;
		}
		Ok(())
	}

	/// Runs an in-memory handshake and returns how many certificates the
	/// server saw from the client.
	fn handshake(
		client: ClientConfig,
		server: rustls::ServerConfig,
	) -> Result<Option<usize>, rustls::Error> {
		let name = ServerName::try_from("bastion-safe.local").unwrap();
		let mut client: rustls::Connection =
			rustls::ClientConnection::new(Arc::new(client), name)?.into();
		let mut server: rustls::Connection = rustls::ServerConnection::new(Arc::new(server))?.into();

		for _ in 0..8 {
			pump(&mut client, &mut server)?;
			pump(&mut server, &mut client)?;
			if !client.is_handshaking() && !server.is_handshaking() {
				break;
			}
		}
		Ok(server.peer_certificates().map(|certs| certs.len()))
	}

	#[test]
	fn mutual_handshake_with_safe_presents_client_svid() {
		let pki = TestPki::new();
		let handle = IdentityHandle::new(pki.issue(&[&format!("{SENTINEL}node-1")]).to_svid());
		let client = SecureChannelFactory::new()
			.client_config(&handle, Authorizer::for_role(gate(), Role::Safe))
			.unwrap();

		let seen = handshake(client, server_config(&pki, &format!("{SAFE}node-1"))).unwrap();
		assert_eq!(seen, Some(1));
	}

	#[test]
	fn handshake_with_non_safe_server_fails_naming_peer() {
		let pki = TestPki::new();
		let handle = IdentityHandle::new(pki.issue(&[&format!("{SENTINEL}node-1")]).to_svid());
		let client = SecureChannelFactory::new()
			.client_config(&handle, Authorizer::for_role(gate(), Role::Safe))
			.unwrap();

		let err = handshake(client, server_config(&pki, &format!("{SENTINEL}impostor"))).unwrap_err();
		let expected = format!("unexpected peer identity '{SENTINEL}impostor': expected safe");
		assert!(matches!(err, rustls::Error::General(ref message) if *message == expected));
	}

	#[test]
	fn builds_client_from_handle() {
		let pki = TestPki::new();
		let handle = IdentityHandle::new(pki.issue(&[&format!("{SENTINEL}node-1")]).to_svid());

		let channel = SecureChannelFactory::new()
			.build(handle, Authorizer::for_role(gate(), Role::Safe))
			.unwrap();
		assert_eq!(channel.local_spiffe_id(), format!("{SENTINEL}node-1"));
	}
}
