// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Master-key fragments.
//!
//! The master key is three fragments in fixed order: age secret key, age
//! public key, AES cipher key. Sentinel carries them newline-joined inside a
//! [`crate::SentinelCommand`]; Safe receives them as separate JSON fields and
//! stores the newline-joined form.

use bastion_common_secret::SecretString;
use thiserror::Error;

use crate::reqres::KeyInputRequest;

const SEPARATOR: char = '\n';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyTripleError {
	#[error("expected 3 newline-separated key fragments, got {0}")]
	WrongPartCount(usize),

	#[error("key fragment '{0}' is empty")]
	EmptyFragment(&'static str),
}

/// The three master-key fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTriple {
	age_secret_key: SecretString,
	age_public_key: SecretString,
	aes_cipher_key: SecretString,
}

impl KeyTriple {
	/// Split a newline-joined triple. Fragments are kept verbatim; anything
	/// other than exactly three parts is rejected.
	pub fn split(joined: &str) -> Result<Self, KeyTripleError> {
		let parts: Vec<&str> = joined.split(SEPARATOR).collect();
		match parts.as_slice() {
			[secret, public, cipher] => Ok(Self {
				age_secret_key: SecretString::from(*secret),
				age_public_key: SecretString::from(*public),
				aes_cipher_key: SecretString::from(*cipher),
			}),
			_ => Err(KeyTripleError::WrongPartCount(parts.len())),
		}
	}

	/// Build a triple from delivered fragments, trimming each one. All three
	/// must be non-empty after trimming.
	pub fn from_fragments(
		age_secret_key: &str,
		age_public_key: &str,
		aes_cipher_key: &str,
	) -> Result<Self, KeyTripleError> {
		let trimmed = |value: &str, name: &'static str| {
			let value = value.trim();
			if value.is_empty() {
				Err(KeyTripleError::EmptyFragment(name))
			} else {
				Ok(SecretString::from(value))
			}
		};

		Ok(Self {
			age_secret_key: trimmed(age_secret_key, "age secret key")?,
			age_public_key: trimmed(age_public_key, "age public key")?,
			aes_cipher_key: trimmed(aes_cipher_key, "AES cipher key")?,
		})
	}

	/// Validate the fragments of a decoded key-delivery body.
	pub fn from_request(request: &KeyInputRequest) -> Result<Self, KeyTripleError> {
		Self::from_fragments(
			&request.age_secret_key,
			&request.age_public_key,
			&request.aes_cipher_key,
		)
	}

	/// `age secret key + "\n" + age public key + "\n" + AES cipher key`.
	pub fn join(&self) -> SecretString {
		SecretString::new(format!(
			"{}{SEPARATOR}{}{SEPARATOR}{}",
			self.age_secret_key.expose(),
			self.age_public_key.expose(),
			self.aes_cipher_key.expose()
		))
	}

	pub fn to_request(&self) -> KeyInputRequest {
		KeyInputRequest {
			age_secret_key: self.age_secret_key.expose().clone(),
			age_public_key: self.age_public_key.expose().clone(),
			aes_cipher_key: self.aes_cipher_key.expose().clone(),
		}
	}

	pub fn age_secret_key(&self) -> &SecretString {
		&self.age_secret_key
	}

	pub fn age_public_key(&self) -> &SecretString {
		&self.age_public_key
	}

	pub fn aes_cipher_key(&self) -> &SecretString {
		&self.aes_cipher_key
	}
}
