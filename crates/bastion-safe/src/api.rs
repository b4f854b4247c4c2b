// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{routing::post, Router};
use bastion_audit::Journal;
use bastion_config::BastionConfig;
use bastion_identity::IdentityGate;
use bastion_protocol::paths;

use crate::custodian::MasterKeyCustodian;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub custodian: MasterKeyCustodian,
	pub gate: IdentityGate,
	pub journal: Journal,
}

impl AppState {
	pub fn new(config: &BastionConfig, custodian: MasterKeyCustodian, journal: Journal) -> Self {
		Self {
			custodian,
			gate: IdentityGate::from_config(config),
			journal,
		}
	}
}

/// Routes Safe serves to Sentinel.
///
/// The TLS acceptor in front of this router must insert the caller's
/// verified SPIFFE ID as a [`crate::PeerIdentity`] request extension.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route(paths::KEYS, post(routes::keys::receive_keys))
		.with_state(state)
}
