// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! X.509-SVIDs: a certificate chain whose leaf names exactly one SPIFFE ID,
//! the matching private key, and the trust bundle used to verify peers.

use std::fmt;

use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use x509_parser::extensions::GeneralName;

use crate::error::{IdentityError, IdentityResult};

const SPIFFE_SCHEME: &str = "spiffe://";

pub struct X509Svid {
	spiffe_id: String,
	cert_chain: Vec<CertificateDer<'static>>,
	private_key: PrivateKeyDer<'static>,
	bundle: Vec<CertificateDer<'static>>,
}

impl X509Svid {
	/// Assemble an SVID, reading the SPIFFE ID from the leaf certificate.
	pub fn new(
		cert_chain: Vec<CertificateDer<'static>>,
		private_key: PrivateKeyDer<'static>,
		bundle: Vec<CertificateDer<'static>>,
	) -> IdentityResult<Self> {
		let leaf = cert_chain
			.first()
			.ok_or_else(|| IdentityError::InvalidDocument("certificate chain is empty".into()))?;
		if bundle.is_empty() {
			return Err(IdentityError::InvalidDocument(
				"trust bundle is empty".into(),
			));
		}
		let spiffe_id = spiffe_id_from_der(leaf.as_ref())?;

		Ok(Self {
			spiffe_id,
			cert_chain,
			private_key,
			bundle,
		})
	}

	/// Parse PEM-encoded chain, key and bundle.
	pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], bundle_pem: &[u8]) -> IdentityResult<Self> {
		let cert_chain = parse_certificates(cert_pem, "certificate chain")?;
		let private_key = PrivateKeyDer::from_pem_slice(key_pem)
			.map_err(|e| IdentityError::InvalidDocument(format!("private key: {e}")))?;
		let bundle = parse_certificates(bundle_pem, "trust bundle")?;

		Self::new(cert_chain, private_key, bundle)
	}

	pub fn spiffe_id(&self) -> &str {
		&self.spiffe_id
	}

	pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
		&self.cert_chain
	}

	pub fn private_key(&self) -> &PrivateKeyDer<'static> {
		&self.private_key
	}

	pub fn bundle(&self) -> &[CertificateDer<'static>] {
		&self.bundle
	}
}

impl fmt::Debug for X509Svid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("X509Svid")
			.field("spiffe_id", &self.spiffe_id)
			.field("cert_chain_len", &self.cert_chain.len())
			.field("private_key", &"[REDACTED]")
			.field("bundle_len", &self.bundle.len())
			.finish()
	}
}

fn parse_certificates(pem: &[u8], what: &str) -> IdentityResult<Vec<CertificateDer<'static>>> {
	CertificateDer::pem_slice_iter(pem)
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| IdentityError::InvalidDocument(format!("{what}: {e}")))
}

/// Extract the SPIFFE ID from a DER certificate's URI SAN.
///
/// The certificate must carry exactly one URI SAN and it must use the
/// `spiffe` scheme.
pub fn spiffe_id_from_der(der: &[u8]) -> IdentityResult<String> {
	let (_, cert) = x509_parser::parse_x509_certificate(der)
		.map_err(|e| IdentityError::InvalidDocument(format!("unparseable certificate: {e}")))?;

	let san = cert
		.subject_alternative_name()
		.map_err(|e| IdentityError::InvalidDocument(format!("malformed SAN extension: {e}")))?
		.ok_or_else(|| IdentityError::InvalidDocument("certificate has no SAN extension".into()))?;

	let uris: Vec<&str> = san
		.value
		.general_names
		.iter()
		.filter_map(|name| match name {
			GeneralName::URI(uri) => Some(*uri),
			_ => None,
		})
		.collect();

	match uris.as_slice() {
		[uri] if uri.starts_with(SPIFFE_SCHEME) => Ok(uri.to_string()),
		[uri] => Err(IdentityError::InvalidDocument(format!(
			"URI SAN '{uri}' is not a SPIFFE ID"
		))),
		[] => Err(IdentityError::InvalidDocument(
			"certificate has no URI SAN".into(),
		)),
		_ => Err(IdentityError::InvalidDocument(format!(
			"certificate has {} URI SANs, expected one",
			uris.len()
		))),
	}
}
