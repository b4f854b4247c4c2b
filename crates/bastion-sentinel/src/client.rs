// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the Safe endpoints Sentinel drives.

use bastion_identity::SecureChannel;
use bastion_protocol::paths::{self, CORRELATION_ID_HEADER, REVEAL_QUERY};
use bastion_protocol::{KeyInputRequest, SecretUpsertRequest, SentinelInitCompleteRequest};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::SentinelResult;

/// What Safe answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeReply {
	pub status: u16,
	pub body: String,
}

impl SafeReply {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

pub struct SafeClient {
	http: Client,
	base_url: Url,
	// Keeps the identity behind `http` alive for as long as the client.
	_channel: Option<SecureChannel>,
}

impl SafeClient {
	pub fn new(http: Client, base_url: Url) -> Self {
		Self {
			http,
			base_url,
			_channel: None,
		}
	}

	/// Client speaking mTLS over `channel`.
	pub fn over_channel(channel: SecureChannel, base_url: Url) -> Self {
		Self {
			http: channel.client().clone(),
			base_url,
			_channel: Some(channel),
		}
	}

	/// `path` appended to the base URL, keeping any base path prefix.
	pub fn endpoint(&self, path: &str) -> Url {
		let mut url = self.base_url.clone();
		let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
		url.set_path(&joined);
		url
	}

	#[instrument(skip(self, request), fields(correlation_id = %correlation_id))]
	pub async fn post_keys(
		&self,
		correlation_id: &str,
		request: &KeyInputRequest,
	) -> SentinelResult<SafeReply> {
		let builder = self.http.post(self.endpoint(paths::KEYS)).json(request);
		self.send(builder, correlation_id).await
	}

	#[instrument(skip(self, request), fields(correlation_id = %correlation_id, workload_id = %request.workload_id))]
	pub async fn upsert_secret(
		&self,
		correlation_id: &str,
		request: &SecretUpsertRequest,
	) -> SentinelResult<SafeReply> {
		let builder = self.http.post(self.endpoint(paths::SECRETS)).json(request);
		self.send(builder, correlation_id).await
	}

	#[instrument(skip(self, request), fields(correlation_id = %correlation_id, workload_id = %request.workload_id))]
	pub async fn delete_secret(
		&self,
		correlation_id: &str,
		request: &SecretUpsertRequest,
	) -> SentinelResult<SafeReply> {
		let builder = self.http.delete(self.endpoint(paths::SECRETS)).json(request);
		self.send(builder, correlation_id).await
	}

	#[instrument(skip(self), fields(correlation_id = %correlation_id))]
	pub async fn post_init_completed(&self, correlation_id: &str) -> SentinelResult<SafeReply> {
		let builder = self
			.http
			.post(self.endpoint(paths::INIT_COMPLETED))
			.json(&SentinelInitCompleteRequest::default());
		self.send(builder, correlation_id).await
	}

	#[instrument(skip(self), fields(correlation_id = %correlation_id))]
	pub async fn list_secrets(
		&self,
		correlation_id: &str,
		reveal: bool,
	) -> SentinelResult<SafeReply> {
		let mut url = self.endpoint(paths::SECRETS);
		if reveal {
			url.query_pairs_mut().append_pair(REVEAL_QUERY, "true");
		}
		self.send(self.http.get(url), correlation_id).await
	}

	async fn send(&self, builder: RequestBuilder, correlation_id: &str) -> SentinelResult<SafeReply> {
		let response = builder
			.header(CORRELATION_ID_HEADER, correlation_id)
			.send()
			.await?;

		let status = response.status().as_u16();
		let body = response.text().await?;
		let reply = SafeReply { status, body };

		if reply.is_success() {
			debug!(status, "Safe accepted request");
		} else {
			warn!(status, "Safe rejected request");
		}
		Ok(reply)
	}
}
