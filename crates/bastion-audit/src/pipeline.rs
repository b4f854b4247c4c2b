// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::{instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::{AuditEvent, JournalEntry};
use crate::sink::AuditSink;

/// Queue in front of the audit sinks.
///
/// Entries are published in the order they were logged. Logging never
/// waits on a sink: a full queue drops the entry with a warning and a
/// failing sink is reported and skipped.
#[derive(Clone)]
pub struct Journal {
	tx: mpsc::Sender<Message>,
}

enum Message {
	Entry(Arc<JournalEntry>),
	Flush(oneshot::Sender<()>),
}

impl Journal {
	/// Start the publishing task. Must be called inside a Tokio runtime.
	pub fn new(queue_capacity: usize, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		tokio::spawn(Self::background_task(rx, sinks));

		Self { tx }
	}

	async fn background_task(
		mut rx: mpsc::Receiver<Message>,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(message) = rx.recv().await {
			let entry = match message {
				Message::Entry(entry) => entry,
				Message::Flush(done) => {
					let _ = done.send(());
					continue;
				}
			};

			for sink in &sinks {
				if !sink.filter().allows(&entry) {
					continue;
				}

				if let Err(e) = sink.publish(Arc::clone(&entry)).await {
					warn!(
						sink = sink.name(),
						correlation_id = %entry.correlation_id,
						error = %e,
						"audit sink publish failed"
					);
				}
			}
		}
	}

	/// Queue `entry` for publishing.
	///
	/// Returns `true` if the entry was queued, `false` if it was dropped.
	#[instrument(skip(self, entry), fields(event = %entry.event, correlation_id = %entry.correlation_id))]
	pub fn log(&self, entry: JournalEntry) -> bool {
		match self.try_log(entry) {
			Ok(()) => true,
			Err(e) => {
				warn!(error = %e, "dropped journal entry");
				false
			}
		}
	}

	/// Stamp `entry` with `event` and the current time, then queue a copy.
	pub fn record(&self, entry: &mut JournalEntry, event: AuditEvent) -> bool {
		entry.event = event;
		entry.timestamp = Utc::now();
		self.log(entry.clone())
	}

	pub fn try_log(&self, entry: JournalEntry) -> AuditResult<()> {
		self.tx.try_send(Message::Entry(Arc::new(entry))).map_err(|e| match e {
			TrySendError::Full(_) => AuditError::QueueFull,
			TrySendError::Closed(_) => AuditError::Shutdown,
		})
	}

	/// Wait until every entry queued before this call has been published.
	pub async fn flush(&self) -> AuditResult<()> {
		let (done_tx, done_rx) = oneshot::channel();
		self.tx
			.send(Message::Flush(done_tx))
			.await
			.map_err(|_| AuditError::Shutdown)?;
		done_rx.await.map_err(|_| AuditError::Shutdown)
	}
}
