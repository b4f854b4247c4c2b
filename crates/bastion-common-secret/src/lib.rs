// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wrapper type for key material and secret values.
//!
//! Master-key fragments, the assembled master key and secret payloads all
//! travel through Sentinel and Safe wrapped in [`Secret<T>`]. The wrapper:
//!
//! - renders `[REDACTED]` for `Debug` and `Display`
//! - zeroizes its contents on drop
//! - has no `Deref`; callers go through [`Secret::expose`]
//!
//! ```
//! use bastion_common_secret::SecretString;
//!
//! let fragment = SecretString::new("AGE-SECRET-KEY-1QQQ".to_string());
//! assert_eq!(format!("{fragment}"), "[REDACTED]");
//! assert_eq!(fragment.expose(), "AGE-SECRET-KEY-1QQQ");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value that refuses to print itself.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value. Every call site is a place where the
	/// secret leaves its wrapper, so keep them few.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

/// Render a possibly-empty sensitive field for audit snapshots.
///
/// Empty input stays empty so a reader can still tell a missing field from
/// a supplied one; anything else becomes [`REDACTED`].
pub fn redact_if_present(value: &str) -> String {
	if value.is_empty() {
		String::new()
	} else {
		REDACTED.to_string()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}
