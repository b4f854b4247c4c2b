// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sentinel, the administrative side of Bastion.
//!
//! [`Sentinel`] turns operator commands into requests to Safe, sent over a
//! mutually authenticated channel that only a Safe identity can terminate.

pub mod client;
pub mod error;
pub mod generator;
pub mod request;
pub mod sentinel;

pub use client::{SafeClient, SafeReply};
pub use error::{SentinelError, SentinelResult};
pub use generator::{GenerationError, PatternGenerator, SecretGenerator, MAX_REPEAT};
pub use request::{key_input_request, resolve_secret_value, ResolvedValue, GENERATION_FAILURE_PREFIX};
pub use sentinel::Sentinel;
