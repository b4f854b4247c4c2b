// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Safe endpoints that accept Sentinel commands, and the headers they read.

/// `POST` with a [`crate::KeyInputRequest`] body.
pub const KEYS: &str = "/sentinel/v1/keys";

/// `POST` (upsert), `DELETE` (delete) with a [`crate::SecretUpsertRequest`]
/// body, or `GET` to list.
pub const SECRETS: &str = "/sentinel/v1/secrets";

/// `POST` with an empty JSON object.
pub const INIT_COMPLETED: &str = "/sentinel/v1/init-completed";

/// Query parameter asking `GET` [`SECRETS`] for decrypted values.
pub const REVEAL_QUERY: &str = "reveal";

/// Header linking a request to the caller's journal entries.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
