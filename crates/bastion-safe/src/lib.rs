// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Safe, the secret store's Sentinel-facing side.
//!
//! - [`MasterKeyCustodian`]: holds the master key assembled from a delivery
//! - [`create_router`]: the key-delivery endpoint, journaled at every
//!   decision point

pub mod api;
pub mod custodian;
pub mod error;
pub mod peer;
pub mod routes;

pub use api::{create_router, AppState};
pub use custodian::MasterKeyCustodian;
pub use error::{SafeError, SafeResult};
pub use peer::{correlation_id, PeerIdentity, CORRELATION_ID_HEADER};
