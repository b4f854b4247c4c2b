// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment lookup with `*_FILE` support.
//!
//! Kubernetes and Docker mount configuration as files, so every setting may
//! be given either directly (`VAR`) or as a path (`VAR_FILE`).

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
	#[error("failed to read {var} from {path}: {source}")]
	Io {
		var: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Look up `var` through `lookup`, honouring `{var}_FILE`.
///
/// `{var}_FILE` wins over `{var}`. A single trailing newline is stripped
/// from file contents. Empty direct values count as unset.
pub fn load_env<F>(var: &str, lookup: F) -> Result<Option<String>, EnvError>
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(value) = load_file_variant(var, &lookup)? {
		return Ok(Some(value));
	}
	Ok(lookup(var).filter(|value| !value.is_empty()))
}

/// Like [`load_env`], but a direct value set to the empty string is
/// returned as `Some("")`.
pub fn load_env_keep_empty<F>(var: &str, lookup: F) -> Result<Option<String>, EnvError>
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(value) = load_file_variant(var, &lookup)? {
		return Ok(Some(value));
	}
	Ok(lookup(var))
}

fn load_file_variant<F>(var: &str, lookup: &F) -> Result<Option<String>, EnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");
	let Some(path_str) = lookup(&file_var) else {
		return Ok(None);
	};
	if path_str.is_empty() {
		return Err(EnvError::EmptyPath { var: file_var });
	}

	let path = PathBuf::from(&path_str);
	let content = fs::read_to_string(&path).map_err(|source| EnvError::Io {
		var: file_var.clone(),
		path: path.clone(),
		source,
	})?;

	Ok(Some(content.strip_suffix('\n').unwrap_or(&content).to_string()))
}
