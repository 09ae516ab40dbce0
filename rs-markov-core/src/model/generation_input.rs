use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Which generation loop to run.
///
/// - `Unrestricted`: runs exactly `target_length` iterations on top of the
///   start sequence, spaces allowed.
/// - `NoSpace`: grows the word until it is `target_length` characters long,
///   never appending a space.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
	Unrestricted,
	#[default]
	NoSpace,
}

/// Strategy used to select the start sequence of a word.
///
/// # Variants
/// - `Random`: a random context of the table's full context length.
/// - `Custom(String)`: use the provided string, which must be at least as
///   long as the context length.
#[derive(Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Custom(String),
}

/// Input parameters for [`crate::Generator::generate`].
///
/// # Responsibilities
/// - Track generation parameters (`target_length`, `policy`, `start_seed`,
///   `seed`, `stall_limit`)
/// - Keep the context length bound to the table the input was made for
/// - Reject probabilities outside `(0, 1]`
///
/// # Invariants
/// - `context_length` is the one the table was trained with
/// - `probability` is always in `(0, 1]`
#[derive(Clone, Debug)]
pub struct GenerationInput {
	/// Context length of the table this input was created from.
	context_length: usize,

	/// Acceptance threshold of every candidate draw.
	probability: f64,

	/// Number of iterations (`Unrestricted`) or final length (`NoSpace`).
	pub target_length: usize,

	/// Generation loop to run.
	pub policy: Policy,

	/// Start sequence strategy.
	pub start_seed: StartSeed,

	/// Seed of the random generator; `None` uses the thread generator.
	pub seed: Option<u64>,

	/// Stop `NoSpace` generation after this many consecutive iterations that
	/// appended nothing. `None` keeps the unbounded loop.
	pub stall_limit: Option<usize>,
}

impl GenerationInput {
	/// Creates an input bound to a table of `context_length`.
	///
	/// Defaults: probability 1.0, no-space policy, random start, no seed and no
	/// stall limit.
	///
	/// # Visibility
	/// - `pub(crate)` so that the context length always comes from a table.
	pub(crate) fn new(context_length: usize) -> Self {
		Self {
			context_length,
			probability: 1.0,
			target_length: 0,
			policy: Policy::default(),
			start_seed: StartSeed::Random,
			seed: None,
			stall_limit: None,
		}
	}

	/// Context length of the table this input was created from.
	pub fn context_length(&self) -> usize {
		self.context_length
	}

	/// Returns the current probability threshold.
	pub fn probability(&self) -> f64 {
		self.probability
	}

	/// Sets the probability threshold (0.0 excluded, 1.0 included).
	///
	/// # Errors
	/// Returns an error if the value is outside `(0, 1]` or NaN.
	pub fn set_probability(&mut self, probability: f64) -> ModelResult<()> {
		if !(probability > 0.0 && probability <= 1.0) {
			return Err(ModelError::InvalidProbability(probability));
		}
		self.probability = probability;
		Ok(())
	}

	/// Sets a custom start sequence.
	///
	/// # Errors
	/// Returns an error if `start` is shorter than the context length.
	pub fn set_start(&mut self, start: &str) -> ModelResult<()> {
		validate_start(start, self.context_length)?;
		self.start_seed = StartSeed::Custom(start.to_owned());
		Ok(())
	}
}

/// Checks that `start` has at least `context_length` characters.
pub fn validate_start(start: &str, context_length: usize) -> ModelResult<()> {
	let actual = start.chars().count();
	if actual < context_length {
		return Err(ModelError::StartTooShort { expected: context_length, actual });
	}
	Ok(())
}
