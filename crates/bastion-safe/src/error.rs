// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bastion_audit::AuditEvent;
use thiserror::Error;

pub type SafeResult<T> = Result<T, SafeError>;

#[derive(Debug, Error)]
pub enum SafeError {
	#[error("caller '{spiffe_id}' is not a Sentinel")]
	BadIdentity { spiffe_id: String },

	#[error("bad payload: {0}")]
	BadPayload(String),
}

impl SafeError {
	pub fn audit_event(&self) -> AuditEvent {
		match self {
			SafeError::BadIdentity { .. } => AuditEvent::BadIdentity,
			SafeError::BadPayload(_) => AuditEvent::BadPayload,
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			SafeError::BadIdentity { .. } => StatusCode::UNAUTHORIZED,
			SafeError::BadPayload(_) => StatusCode::BAD_REQUEST,
		}
	}
}

/// Rejections carry no body.
impl IntoResponse for SafeError {
	fn into_response(self) -> Response {
		self.status_code().into_response()
	}
}
