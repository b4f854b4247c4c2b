// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Destinations for journal entries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::JournalEntry;
use crate::filter::AuditFilter;

#[cfg(feature = "sink-tracing")]
pub mod tracing;

#[async_trait]
pub trait AuditSink: Send + Sync {
	fn name(&self) -> &str;

	fn filter(&self) -> &AuditFilter;

	async fn publish(&self, entry: Arc<JournalEntry>) -> Result<(), AuditSinkError>;
}
