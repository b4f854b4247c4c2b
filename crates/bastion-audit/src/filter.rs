// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::event::{AuditEvent, AuditSeverity, JournalEntry};

/// Per-sink selection of journal entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFilter {
	pub min_severity: AuditSeverity,
	pub exclude_events: Vec<AuditEvent>,
}

impl Default for AuditFilter {
	fn default() -> Self {
		Self {
			min_severity: AuditSeverity::Info,
			exclude_events: Vec::new(),
		}
	}
}

impl AuditFilter {
	pub fn allows(&self, entry: &JournalEntry) -> bool {
		entry.severity() >= self.min_severity && !self.exclude_events.contains(&entry.event)
	}
}
