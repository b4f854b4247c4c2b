// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The local identity agent.
//!
//! The agent owns this workload's X.509-SVID and rotates it. Bastion only
//! ever asks it for the current SVID; how the agent attests the workload is
//! its own business.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{IdentityError, IdentityResult};
use crate::svid::X509Svid;

/// Leaf certificate (plus intermediates) in PEM.
pub const SVID_FILE: &str = "svid.pem";
/// Private key matching the leaf, PKCS#8 PEM.
pub const SVID_KEY_FILE: &str = "svid_key.pem";
/// Trust bundle in PEM.
pub const BUNDLE_FILE: &str = "bundle.pem";

#[async_trait]
pub trait IdentityAgent: Send + Sync {
	/// Where the agent lives, for log and error messages.
	fn address(&self) -> &str;

	/// Fetch the current X.509-SVID for this workload.
	async fn fetch_x509_svid(&self) -> IdentityResult<X509Svid>;
}

/// Agent that reads SVIDs written to a directory by a SPIFFE helper.
///
/// Expects [`SVID_FILE`], [`SVID_KEY_FILE`] and [`BUNDLE_FILE`] side by side.
#[derive(Debug, Clone)]
pub struct FileIdentityAgent {
	address: String,
	dir: PathBuf,
}

impl FileIdentityAgent {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		let dir = dir.into();
		Self {
			address: dir.display().to_string(),
			dir,
		}
	}

	/// Accepts `file:///path` or a bare filesystem path.
	pub fn from_address(address: &str) -> IdentityResult<Self> {
		if !address.contains("://") {
			return Ok(Self::new(address));
		}

		let url = Url::parse(address).map_err(|e| IdentityError::AgentUnreachable {
			address: address.to_string(),
			reason: e.to_string(),
		})?;
		if url.scheme() != "file" {
			return Err(IdentityError::AgentUnreachable {
				address: address.to_string(),
				reason: format!("unsupported agent scheme '{}'", url.scheme()),
			});
		}
		let dir = url
			.to_file_path()
			.map_err(|()| IdentityError::AgentUnreachable {
				address: address.to_string(),
				reason: "not a local path".into(),
			})?;

		Ok(Self {
			address: address.to_string(),
			dir,
		})
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	async fn read(&self, name: &str) -> IdentityResult<Vec<u8>> {
		let path = self.dir.join(name);
		tokio::fs::read(&path).await.map_err(|e| {
			IdentityError::NoIdentity(format!("cannot read {}: {e}", path.display()))
		})
	}
}

#[async_trait]
impl IdentityAgent for FileIdentityAgent {
	fn address(&self) -> &str {
		&self.address
	}

	#[instrument(skip(self), fields(address = %self.address))]
	async fn fetch_x509_svid(&self) -> IdentityResult<X509Svid> {
		let metadata = tokio::fs::metadata(&self.dir).await.map_err(|e| {
			IdentityError::AgentUnreachable {
				address: self.address.clone(),
				reason: e.to_string(),
			}
		})?;
		if !metadata.is_dir() {
			return Err(IdentityError::AgentUnreachable {
				address: self.address.clone(),
				reason: "not a directory".into(),
			});
		}

		let cert_pem = self.read(SVID_FILE).await?;
		let key_pem = self.read(SVID_KEY_FILE).await?;
		let bundle_pem = self.read(BUNDLE_FILE).await?;

		let svid = X509Svid::from_pem(&cert_pem, &key_pem, &bundle_pem)?;
		debug!(spiffe_id = %svid.spiffe_id(), "fetched X.509-SVID");
		Ok(svid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::TestPki;

	fn write_svid(dir: &Path, spiffe_id: &str) {
		let issued = TestPki::new().issue(&[spiffe_id]);
		std::fs::write(dir.join(SVID_FILE), &issued.cert_pem).unwrap();
		std::fs::write(dir.join(SVID_KEY_FILE), &issued.key_pem).unwrap();
		std::fs::write(dir.join(BUNDLE_FILE), &issued.bundle_pem).unwrap();
	}

	#[tokio::test]
	async fn reads_svid_from_directory() {
		let dir = tempfile::tempdir().unwrap();
		write_svid(dir.path(), "spiffe://bastion.dev/workload/bastion-sentinel/n/1");

		let agent = FileIdentityAgent::new(dir.path());
		let svid = agent.fetch_x509_svid().await.unwrap();
		assert_eq!(svid.spiffe_id(), "spiffe://bastion.dev/workload/bastion-sentinel/n/1");
	}

	#[tokio::test]
	async fn missing_directory_is_unreachable() {
		let agent = FileIdentityAgent::new("/nonexistent/bastion/agent");
		assert!(matches!(
			agent.fetch_x509_svid().await,
			Err(IdentityError::AgentUnreachable { .. })
		));
	}

	#[tokio::test]
	async fn empty_directory_has_no_identity() {
		let dir = tempfile::tempdir().unwrap();
		let agent = FileIdentityAgent::new(dir.path());
		assert!(matches!(
			agent.fetch_x509_svid().await,
			Err(IdentityError::NoIdentity(_))
		));
	}

	#[test]
	fn parses_file_url() {
		let agent = FileIdentityAgent::from_address("file:///run/spire/svid").unwrap();
		assert_eq!(agent.dir(), Path::new("/run/spire/svid"));
		assert_eq!(agent.address(), "file:///run/spire/svid");
	}

	#[test]
	fn bare_path_is_accepted() {
		let agent = FileIdentityAgent::from_address("/run/spire/svid").unwrap();
		assert_eq!(agent.dir(), Path::new("/run/spire/svid"));
	}

	#[test]
	fn rejects_other_schemes() {
		let err = FileIdentityAgent::from_address("unix:///run/spire/agent.sock").unwrap_err();
		assert!(err.to_string().contains("unsupported agent scheme"));
	}
}
