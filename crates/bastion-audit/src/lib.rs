// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit journal for Sentinel and Safe.
//!
//! Every protected operation opens a [`JournalEntry`] keyed by a correlation
//! id and re-emits it through the [`Journal`] at each decision point until a
//! terminal [`AuditEvent`] is reached. Entity snapshots never carry key
//! material or secret values.

pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{
	new_correlation_id, AuditEvent, AuditSeverity, Entity, JournalEntry, KeyInputSnapshot,
	SecretSnapshot,
};
pub use filter::AuditFilter;
pub use pipeline::Journal;
pub use sink::AuditSink;

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
