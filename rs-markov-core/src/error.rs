use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the validating layer of the crate.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating generation inputs or loading a corpus.
///
/// Table construction and the generation loops themselves never fail: an
/// unknown context is a normal end of generation, not an error.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("context length must be >= 1, got {0}")]
	InvalidContextLength(usize),

	#[error("probability must be in (0, 1], got {0}")]
	InvalidProbability(f64),

	#[error("start sequence must be at least {expected} characters long, got {actual}")]
	StartTooShort { expected: usize, actual: usize },

	#[error("input made for context length {input}, table trained with {table}")]
	ContextLengthMismatch { table: usize, input: usize },

	#[error("no context of order {0} available for a random start")]
	EmptyModel(usize),

	#[error("failed to read {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid path: {0}")]
	InvalidPath(String),
}

impl ModelError {
	/// True when the error comes from a caller-supplied value rather than the
	/// environment.
	pub fn is_validation(&self) -> bool {
		matches!(
			self,
			Self::InvalidContextLength(_)
				| Self::InvalidProbability(_)
				| Self::StartTooShort { .. }
				| Self::ContextLengthMismatch { .. }
		)
	}

	/// True when the underlying I/O error is a missing file.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
	}
}
