// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turning an operator command into wire requests.

use bastion_protocol::{KeyInputRequest, KeyTriple, KeyTripleError, SentinelCommand};

use crate::generator::{GenerationError, SecretGenerator};

/// Prefix of the value sent in place of a secret whose pattern failed to
/// generate.
pub const GENERATION_FAILURE_PREFIX: &str = "ParseError:";

/// The secret value to send, and the generation error if one was swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
	pub value: String,
	pub generation_error: Option<GenerationError>,
}

/// Resolve the value of an upsert or delete.
///
/// A secret starting with `generation_prefix` is a pattern: the prefix is
/// stripped and the rest handed to `generator`. When generation fails the
/// value becomes `ParseError:<pattern>` so the request still goes out,
/// visibly broken. An empty prefix disables generation.
pub fn resolve_secret_value(
	secret: &str,
	generation_prefix: &str,
	generator: &dyn SecretGenerator,
) -> ResolvedValue {
	let pattern = match secret.strip_prefix(generation_prefix) {
		Some(pattern) if !generation_prefix.is_empty() => pattern,
		_ => {
			return ResolvedValue {
				value: secret.to_string(),
				generation_error: None,
			}
		}
	};

	match generator.generate(pattern) {
		Ok(value) => ResolvedValue {
			value,
			generation_error: None,
		},
		Err(e) => ResolvedValue {
			value: format!("{GENERATION_FAILURE_PREFIX}{pattern}"),
			generation_error: Some(e),
		},
	}
}

/// Build the key-delivery body from the command's newline-joined keys.
pub fn key_input_request(command: &SentinelCommand) -> Result<KeyInputRequest, KeyTripleError> {
	Ok(KeyTriple::split(&command.input_keys)?.to_request())
}
