use std::path::Path;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ModelError, ModelResult};
use crate::io;
use crate::model::context_table::ContextTable;
use crate::model::draws::UniformSource;
use crate::model::generation_input::{validate_start, GenerationInput, Policy, StartSeed};

/// Returns the last `n` characters of a string.
///
/// If `n` is greater than the number of characters in `s`, the entire string
/// is returned. UTF-8 safe: counts characters, never splits one.
fn last_n_chars(s: &str, n: usize) -> &str {
	let count = s.chars().count();
	if n >= count {
		return s;
	}
	let start = s.char_indices().nth(count - n).map_or(s.len(), |(index, _)| index);
	&s[start..]
}

/// Generates a word, spaces allowed.
///
/// Runs exactly `target_length` iterations on top of `start`. Each iteration
/// looks up the last `context_length` characters of the word (or the whole
/// word if shorter) and appends the character picked by
/// [`crate::model::state::State::select`].
///
/// # Behavior
/// - An unknown context ends generation at once.
/// - An iteration where no candidate passed the gate appends nothing; the
///   next iteration retries the same context with fresh draws.
/// - The result is `start` plus at most `target_length` characters.
pub fn generate<D>(
	start: &str,
	table: &ContextTable,
	target_length: usize,
	probability: f64,
	context_length: usize,
	draws: &mut D,
) -> String
where
	D: UniformSource + ?Sized,
{
	let mut word = start.to_owned();

	for _ in 0..target_length {
		let context = last_n_chars(&word, context_length);
		let Some(state) = table.get(context) else {
			trace!("unknown context {context:?}, stopping at {word:?}");
			break;
		};

		if let Some(c) = state.select(probability, false, draws) {
			word.push(c);
		}
	}

	word
}

/// Generates a word without ever appending a space.
///
/// Grows the word while it is shorter than `target_length` characters, using
/// the same lookup and selection as [`generate`] except that a space
/// candidate is never accepted.
///
/// # Behavior
/// - An unknown context ends generation at once.
/// - A `start` already `target_length` long or longer is returned unchanged.
///
/// # Stalls
/// When no candidate passes the gate the word does not grow, the context
/// does not change, and the loop tries again. A context whose only successor
/// is a space, or a tiny `probability`, can therefore spin forever. With
/// `stall_limit = None` that loop is kept as is; `Some(k)` stops generation
/// after `k` consecutive iterations that appended nothing.
pub fn generate_no_space<D>(
	start: &str,
	table: &ContextTable,
	target_length: usize,
	probability: f64,
	context_length: usize,
	stall_limit: Option<usize>,
	draws: &mut D,
) -> String
where
	D: UniformSource + ?Sized,
{
	let mut word = start.to_owned();
	let mut len = word.chars().count();
	let mut stalled = 0;

	while len < target_length {
		let context = last_n_chars(&word, context_length);
		let Some(state) = table.get(context) else {
			trace!("unknown context {context:?}, stopping at {word:?}");
			break;
		};

		match state.select(probability, true, draws) {
			Some(c) => {
				word.push(c);
				len += 1;
				stalled = 0;
			}
			None => {
				stalled += 1;
				if stall_limit.is_some_and(|limit| stalled >= limit) {
					warn!("generation stalled {stalled} times on {context:?}, stopping at {word:?}");
					break;
				}
			}
		}
	}

	word
}

/// High-level interface over a trained [`ContextTable`].
///
/// # Responsibilities
/// - Train the table from a text or a corpus file, with a validated context length
/// - Hand out [`GenerationInput`]s bound to the table's context length
/// - Resolve the start sequence and run the selected policy with seeded or
///   injected randomness
#[derive(Clone, Debug)]
pub struct Generator {
	table: ContextTable,
}

impl Generator {
	/// Trains a generator from a normalized text.
	///
	/// # Errors
	/// Returns an error if `context_length < 1`.
	pub fn train(text: &str, context_length: usize) -> ModelResult<Self> {
		if context_length < 1 {
			return Err(ModelError::InvalidContextLength(context_length));
		}
		Ok(Self { table: ContextTable::build(text, context_length) })
	}

	/// Loads a corpus with [`io::load_text`] and trains a generator from it.
	///
	/// # Errors
	/// - Returns an error if the file cannot be read.
	/// - Returns an error if `context_length < 1`.
	pub fn from_file<P: AsRef<Path>>(filepath: P, context_length: usize) -> ModelResult<Self> {
		if context_length < 1 {
			return Err(ModelError::InvalidContextLength(context_length));
		}
		let text = io::load_text(&filepath)?;
		debug!("loaded {} ({} bytes)", filepath.as_ref().display(), text.len());
		Self::train(&text, context_length)
	}

	/// The trained table.
	pub fn table(&self) -> &ContextTable {
		&self.table
	}

	/// Context length the table was trained with.
	pub fn context_length(&self) -> usize {
		self.table.context_length()
	}

	/// Creates a new `GenerationInput` bound to this generator's context length.
	pub fn make_generation_input(&self) -> GenerationInput {
		GenerationInput::new(self.table.context_length())
	}

	/// Generates a word.
	///
	/// Draws come from a `StdRng` seeded with `input.seed` when set, so equal
	/// inputs give equal words; otherwise from the thread generator.
	///
	/// # Errors
	/// See [`Generator::generate_with`].
	pub fn generate(&self, input: &GenerationInput) -> ModelResult<String> {
		match input.seed {
			Some(seed) => self.generate_with(input, &mut StdRng::seed_from_u64(seed)),
			None => self.generate_with(input, &mut rand::rng()),
		}
	}

	/// Generates a word using `draws` for every random decision, the random
	/// start included.
	///
	/// # Errors
	/// - `ContextLengthMismatch` if `input` was made for another table.
	/// - `StartTooShort` if a custom start is shorter than the context length.
	/// - `EmptyModel` if a random start is requested and the table has no
	///   context of full length.
	pub fn generate_with<D>(&self, input: &GenerationInput, draws: &mut D) -> ModelResult<String>
	where
		D: UniformSource + ?Sized,
	{
		let context_length = self.table.context_length();
		if input.context_length() != context_length {
			return Err(ModelError::ContextLengthMismatch {
				table: context_length,
				input: input.context_length(),
			});
		}

		let start = match &input.start_seed {
			StartSeed::Custom(start) => {
				validate_start(start, context_length)?;
				start.clone()
			}
			StartSeed::Random => self
				.table
				.random_context(context_length, draws)
				.map(str::to_owned)
				.ok_or(ModelError::EmptyModel(context_length))?,
		};

		let word = match input.policy {
			Policy::Unrestricted => {
				generate(&start, &self.table, input.target_length, input.probability(), context_length, draws)
			}
			Policy::NoSpace => generate_no_space(
				&start,
				&self.table,
				input.target_length,
				input.probability(),
				context_length,
				input.stall_limit,
				draws,
			),
		};

		debug!("generated {word:?} from {start:?} ({:?})", input.policy);
		Ok(word)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::draws::ScriptedDraws;

	const CORPUS: &str = "the cat sat on the mat";

	#[test]
	fn last_n_chars_handles_short_and_multibyte() {
		assert_eq!(last_n_chars("hello", 2), "lo");
		assert_eq!(last_n_chars("hi", 5), "hi");
		assert_eq!(last_n_chars("héé", 2), "éé");
		assert_eq!(last_n_chars("abc", 0), "");
		assert_eq!(last_n_chars("", 3), "");
	}

	#[test]
	fn greedy_walk_is_fully_determined() {
		let table = ContextTable::build(CORPUS, 2);
		let word = generate("th", &table, 3, 1.0, 2, &mut rand::rng());
		// "th" -> 'e', "he" -> ' ', "e " -> 'c' (first of a tie with 'm')
		assert_eq!(word, "the c");
	}

	#[test]
	fn unrestricted_stops_on_unknown_context() {
		let table = ContextTable::build(CORPUS, 2);
		assert_eq!(generate("zz", &table, 5, 1.0, 2, &mut ScriptedDraws::constant(0.0)), "zz");
		assert_eq!(generate("e", &table, 0, 1.0, 2, &mut ScriptedDraws::constant(0.0)), "e");
	}

	#[test]
	fn unrestricted_keeps_iterating_after_empty_pick() {
		let table = ContextTable::build(CORPUS, 1);
		// "t" has h(2), ' '(2); first iteration rejects both, second takes 'h'
		let mut draws = ScriptedDraws::new([0.9, 0.9, 0.1, 0.1]);
		let word = generate("t", &table, 2, 0.5, 1, &mut draws);
		assert_eq!(word, "th");
		assert_eq!(draws.consumed(), 4);
	}

	#[test]
	fn no_space_caps_length_and_skips_spaces() {
		let table = ContextTable::build(CORPUS, 1);
		// "t" -> 'h', "h" -> 'e', "e" -> only ' ' which is refused
		let word = generate_no_space("t", &table, 10, 1.0, 1, Some(3), &mut ScriptedDraws::constant(0.0));
		assert_eq!(word, "the");

		let word = generate_no_space("t", &table, 2, 1.0, 1, None, &mut ScriptedDraws::constant(0.0));
		assert_eq!(word, "th");
	}

	#[test]
	fn no_space_zero_length_returns_start() {
		let table = ContextTable::build(CORPUS, 2);
		assert_eq!(generate_no_space("th", &table, 0, 1.0, 2, None, &mut rand::rng()), "th");
		assert_eq!(generate_no_space("the cat", &table, 3, 1.0, 2, None, &mut rand::rng()), "the cat");
	}

	#[test]
	fn stall_limit_counts_consecutive_empty_iterations() {
		let table = ContextTable::build(CORPUS, 1);
		let mut draws = ScriptedDraws::constant(0.99);
		let word = generate_no_space("t", &table, 5, 0.5, 1, Some(4), &mut draws);
		assert_eq!(word, "t");
		// two candidates per iteration, four iterations
		assert_eq!(draws.consumed(), 8);
	}

	#[test]
	fn generator_rejects_invalid_inputs() {
		assert!(matches!(Generator::train(CORPUS, 0), Err(ModelError::InvalidContextLength(0))));

		let generator = Generator::train(CORPUS, 3).unwrap();
		let mut input = generator.make_generation_input();
		input.start_seed = StartSeed::Custom("th".to_owned());
		assert!(matches!(generator.generate(&input), Err(ModelError::StartTooShort { .. })));

		let other = Generator::train(CORPUS, 2).unwrap();
		let input = other.make_generation_input();
		assert!(matches!(generator.generate(&input), Err(ModelError::ContextLengthMismatch { .. })));
	}

	#[test]
	fn generator_random_start_needs_contexts() {
		let generator = Generator::train("ab", 1).unwrap();
		let input = generator.make_generation_input();
		assert!(matches!(generator.generate(&input), Err(ModelError::EmptyModel(1))));
	}

	#[test]
	fn generator_dispatches_policies() {
		let generator = Generator::train(CORPUS, 2).unwrap();
		let mut input = generator.make_generation_input();
		input.set_start("th").unwrap();
		input.target_length = 3;

		input.policy = Policy::Unrestricted;
		assert_eq!(generator.generate(&input).unwrap(), "the c");

		input.policy = Policy::NoSpace;
		input.stall_limit = Some(10);
		assert_eq!(generator.generate(&input).unwrap(), "the");
	}
}
