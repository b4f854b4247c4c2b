// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Holder of the assembled master key.

use std::fmt;
use std::sync::Arc;

use bastion_common_secret::SecretString;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Single-slot register for the master key.
///
/// Starts empty. [`set_master_key`](Self::set_master_key) replaces the held
/// value unconditionally; readers see the latest write. Cloning shares the
/// slot. No validation happens here: callers authorize and validate before
/// writing.
#[derive(Clone, Default)]
pub struct MasterKeyCustodian {
	slot: Arc<RwLock<Option<SecretString>>>,
}

impl MasterKeyCustodian {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `key`, returning `true` when it replaced an earlier one.
	#[instrument(skip_all)]
	pub async fn set_master_key(&self, key: SecretString) -> bool {
		let replaced = self.slot.write().await.replace(key).is_some();
		if replaced {
			warn!("master key replaced by a later delivery");
		} else {
			info!("master key set");
		}
		replaced
	}

	pub async fn master_key(&self) -> Option<SecretString> {
		self.slot.read().await.clone()
	}

	pub async fn is_set(&self) -> bool {
		self.slot.read().await.is_some()
	}
}

impl fmt::Debug for MasterKeyCustodian {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MasterKeyCustodian").finish_non_exhaustive()
	}
}
