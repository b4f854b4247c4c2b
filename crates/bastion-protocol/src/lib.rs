// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command protocol shared by Sentinel (issuing side) and Safe (receiving side).
//!
//! - [`SentinelCommand`]: the internal description of what an operator asked for
//! - [`KeyInputRequest`], [`SecretUpsertRequest`], [`SentinelInitCompleteRequest`]:
//!   the JSON bodies on the wire
//! - [`KeyTriple`]: the three master-key fragments and their newline-joined form
//! - [`paths`]: the Safe endpoints the commands are sent to

pub mod data;
pub mod keys;
pub mod paths;
pub mod reqres;

pub use data::{BackingStore, CommandKind, SecretFormat, SentinelCommand};
pub use keys::{KeyTriple, KeyTripleError};
pub use reqres::{
	KeyInputRequest, SecretUpsertRequest, SentinelInitCompleteRequest, EXPIRES_NEVER,
	NOT_BEFORE_NOW,
};
