// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload identity for Sentinel and Safe.
//!
//! Authorization in Bastion rests entirely on SPIFFE IDs:
//!
//! - **Gate** ([`IdentityGate`]): classifies a verified SPIFFE ID into a
//!   [`Role`] by prefix
//! - **Source** ([`IdentitySource`]): fetches this process's X.509-SVID from
//!   the local identity agent and checks it carries the expected role,
//!   bounded by cancellation and a deadline
//! - **Channel** ([`SecureChannelFactory`]): turns an acquired identity into
//!   an mTLS HTTP client that only talks to peers the [`Authorizer`] accepts
//!
//! # Security Design
//!
//! - A SPIFFE ID is only inspected after the certificate carrying it has
//!   been chain-verified against the trust bundle
//! - Peer hostnames are not checked; the SPIFFE ID is the peer's name
//! - Private keys never appear in `Debug` output

pub mod agent;
pub mod channel;
pub mod error;
pub mod gate;
pub mod source;
pub mod svid;

pub use agent::{FileIdentityAgent, IdentityAgent, BUNDLE_FILE, SVID_FILE, SVID_KEY_FILE};
pub use channel::{AuthorizationError, Authorizer, SecureChannel, SecureChannelFactory};
pub use error::{IdentityError, IdentityResult};
pub use gate::{is_safe, is_sentinel, is_workload, IdentityGate, Role};
pub use source::{IdentityHandle, IdentitySource};
pub use svid::{spiffe_id_from_der, X509Svid};

#[cfg(any(test, feature = "test-util"))]
pub mod test_support {
	use rcgen::{BasicConstraints, Certificate, CertificateParams, Ia5String, IsCa, KeyPair, SanType};

	/// A throwaway trust domain: one CA and the means to issue SVIDs from it.
	pub struct TestPki {
		ca_cert: Certificate,
		ca_key: KeyPair,
	}

	pub struct IssuedSvid {
		pub cert_pem: String,
		pub key_pem: String,
		pub bundle_pem: String,
		pub cert_der: Vec<u8>,
	}

	impl TestPki {
		pub fn new() -> Self {
			let ca_key = KeyPair::generate().unwrap();
			let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
			params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
			let ca_cert = params.self_signed(&ca_key).unwrap();
			Self { ca_cert, ca_key }
		}

		pub fn issue(&self, uris: &[&str]) -> IssuedSvid {
			let key = KeyPair::generate().unwrap();
			let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
			params.subject_alt_names = uris
				.iter()
				.map(|uri| SanType::URI(Ia5String::try_from(uri.to_string()).unwrap()))
				.collect();
			let cert = params.signed_by(&key, &self.ca_cert, &self.ca_key).unwrap();

			IssuedSvid {
				cert_pem: cert.pem(),
				key_pem: key.serialize_pem(),
				bundle_pem: self.ca_cert.pem(),
				cert_der: cert.der().to_vec(),
			}
		}
	}

	impl IssuedSvid {
		pub fn to_svid(&self) -> crate::X509Svid {
			crate::X509Svid::from_pem(
				self.cert_pem.as_bytes(),
				self.key_pem.as_bytes(),
				self.bundle_pem.as_bytes(),
			)
			.unwrap()
		}
	}
}
