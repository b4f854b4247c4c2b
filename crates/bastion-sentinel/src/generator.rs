// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Random secret values from patterns.
//!
//! A pattern is a sequence of atoms, each optionally followed by a
//! quantifier:
//!
//! - a literal character, e.g. `a` or `-`
//! - a character class, e.g. `[a-z0-9_]`
//! - an escape: `\d` (digit), `\w` (word character), `\x` (lowercase hex
//!   digit), or `\` followed by any other character for that literal
//! - a quantifier `{n}` or `{m,n}` repeats the preceding atom
//!
//! `[a-zA-Z]{4}-\d{4}` yields values such as `qRtz-0917`.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Largest repeat count a quantifier may ask for.
pub const MAX_REPEAT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
	#[error("pattern is empty")]
	EmptyPattern,

	#[error("unterminated character class")]
	UnterminatedClass,

	#[error("character class is empty")]
	EmptyClass,

	#[error("invalid range '{0}-{1}'")]
	InvalidRange(char, char),

	#[error("pattern ends with a lone backslash")]
	DanglingEscape,

	#[error("invalid quantifier '{0}'")]
	InvalidQuantifier(String),

	#[error("quantifier has nothing to repeat")]
	NothingToRepeat,

	#[error("unexpected '{0}'")]
	Unexpected(char),
}

/// Turns a pattern into a secret value.
pub trait SecretGenerator: Send + Sync {
	fn generate(&self, pattern: &str) -> Result<String, GenerationError>;
}

/// [`SecretGenerator`] for the pattern language described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternGenerator;

impl PatternGenerator {
	pub fn new() -> Self {
		Self
	}
}

impl SecretGenerator for PatternGenerator {
	fn generate(&self, pattern: &str) -> Result<String, GenerationError> {
		let pieces = parse(pattern)?;
		let mut rng = rand::thread_rng();

		let mut out = String::new();
		for piece in &pieces {
			let count = rng.gen_range(piece.min..=piece.max);
			for _ in 0..count {
				if let Some(c) = piece.choices.choose(&mut rng) {
					out.push(*c);
				}
			}
		}
		Ok(out)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Piece {
	choices: Vec<char>,
	min: usize,
	max: usize,
}

fn parse(pattern: &str) -> Result<Vec<Piece>, GenerationError> {
	if pattern.is_empty() {
		return Err(GenerationError::EmptyPattern);
	}

	let mut pieces: Vec<Piece> = Vec::new();
	let mut chars = pattern.chars().peekable();

	while let Some(c) = chars.next() {
		let choices = match c {
			'[' => parse_class(&mut chars)?,
			'\\' => escape(chars.next().ok_or(GenerationError::DanglingEscape)?),
			'{' => {
				let (min, max) = parse_quantifier(&mut chars)?;
				let last = pieces.last_mut().ok_or(GenerationError::NothingToRepeat)?;
				if last.min != 1 || last.max != 1 {
					return Err(GenerationError::NothingToRepeat);
				}
				last.min = min;
				last.max = max;
				continue;
			}
			']' | '}' => return Err(GenerationError::Unexpected(c)),
			literal => vec![literal],
		};
		pieces.push(Piece {
			choices,
			min: 1,
			max: 1,
		});
	}

	Ok(pieces)
}

fn escape(c: char) -> Vec<char> {
	match c {
		'd' => ('0'..='9').collect(),
		'w' => ('a'..='z')
			.chain('A'..='Z')
			.chain('0'..='9')
			.chain(std::iter::once('_'))
			.collect(),
		'x' => ('0'..='9').chain('a'..='f').collect(),
		other => vec![other],
	}
}

fn parse_class(
	chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Vec<char>, GenerationError> {
	let mut choices = Vec::new();

	loop {
		let c = chars.next().ok_or(GenerationError::UnterminatedClass)?;
		match c {
			']' => break,
			'\\' => {
				let escaped = chars.next().ok_or(GenerationError::DanglingEscape)?;
				choices.extend(escape(escaped));
			}
			start if chars.peek() == Some(&'-') => {
				chars.next();
				match chars.peek().copied() {
					// A trailing '-' is a literal.
					Some(']') | None => {
						choices.push(start);
						choices.push('-');
					}
					Some(end) => {
						chars.next();
						if end < start {
							return Err(GenerationError::InvalidRange(start, end));
						}
						choices.extend(start..=end);
					}
				}
			}
			literal => choices.push(literal),
		}
	}

	if choices.is_empty() {
		return Err(GenerationError::EmptyClass);
	}
	choices.sort_unstable();
	choices.dedup();
	Ok(choices)
}

fn parse_quantifier(
	chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<(usize, usize), GenerationError> {
	let mut body = String::new();
	loop {
		match chars.next() {
			Some('}') => break,
			Some(c) => body.push(c),
			None => return Err(GenerationError::InvalidQuantifier(body)),
		}
	}

	let invalid = || GenerationError::InvalidQuantifier(body.clone());
	let parse_count = |s: &str| s.trim().parse::<usize>().map_err(|_| invalid());

	let (min, max) = match body.split_once(',') {
		Some((min, max)) => (parse_count(min)?, parse_count(max)?),
		None => {
			let n = parse_count(&body)?;
			(n, n)
		}
	};

	if min > max || max > MAX_REPEAT {
		return Err(invalid());
	}
	Ok((min, max))
}
