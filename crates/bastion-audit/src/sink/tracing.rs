// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::{AuditSeverity, JournalEntry};
use crate::filter::AuditFilter;
use crate::sink::AuditSink;

/// Writes journal entries as structured events on the `bastion_audit`
/// tracing target.
pub struct TracingAuditSink {
	filter: AuditFilter,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilter) -> Self {
		Self { filter }
	}
}

impl Default for TracingAuditSink {
	fn default() -> Self {
		Self::new(AuditFilter::default())
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilter {
		&self.filter
	}

	async fn publish(&self, entry: Arc<JournalEntry>) -> Result<(), AuditSinkError> {
		let entity = serde_json::to_string(&entry.entity)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize entity: {e}")))?;

		macro_rules! emit {
			($level:ident) => {
				::tracing::$level!(
					target: "bastion_audit",
					correlation_id = %entry.correlation_id,
					spiffe_id = %entry.spiffe_id,
					method = %entry.method,
					path = %entry.path,
					event = %entry.event,
					entity = %entity,
					timestamp = %entry.timestamp.to_rfc3339(),
					"journal"
				)
			};
		}

		match entry.severity() {
			AuditSeverity::Info | AuditSeverity::Notice => emit!(info),
			AuditSeverity::Warning => emit!(warn),
			AuditSeverity::Error => emit!(error),
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEvent;

	#[tokio::test]
	async fn publishes_every_severity() {
		let sink = TracingAuditSink::default();
		for event in [AuditEvent::Ok, AuditEvent::BadPayload, AuditEvent::Timeout] {
			let mut entry = JournalEntry::new("cid", "spiffe://x", "POST", "/p");
			entry.event = event;
			sink.publish(Arc::new(entry)).await.unwrap();
		}
	}
}
