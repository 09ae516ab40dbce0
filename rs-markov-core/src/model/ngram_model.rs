use std::collections::HashMap;

use super::draws::UniformSource;
use super::state::State;

/// Contexts of a single fixed length, with their observed successors.
///
/// An order-`n` model stores every context of exactly `n` characters seen in
/// the training text, together with the characters that followed it.
///
/// # Responsibilities
/// - Scan a training text and accumulate transition counts for its order
/// - Look a context up
/// - Pick a random context (used to seed generation)
///
/// # Invariants
/// - `order` is always >= 1
/// - Each key of `states` is exactly `order` characters long
/// - All state transitions have occurrence counts >= 1
#[derive(Clone, Debug)]
pub struct NGramModel {
	/// Number of characters in every context of this model.
	order: usize,

	/// Mapping from a context to its corresponding state.
	states: HashMap<String, State>,
}

impl NGramModel {
	/// Creates a new empty model of the given context length.
	///
	/// Only [`super::context_table::ContextTable::build`] creates models, and it
	/// iterates orders from 1.
	pub(crate) fn new(order: usize) -> Self {
		debug_assert!(order >= 1, "context order must be >= 1");
		Self { order, states: HashMap::new() }
	}

	/// Context length of this model.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Adds every `(context, next)` pair of `text` for this order.
	///
	/// A pair starting at index `i` is recorded only when
	/// `i + order + 1 < text.len()`, so the last character of the text is
	/// never counted as a successor.
	pub fn add_text(&mut self, text: &[char]) {
		let window = self.order + 1;
		if text.len() <= window {
			// Text too short, no pair passes the bound
			return;
		}

		for i in 0..text.len() - window {
			let context: String = text[i..i + self.order].iter().collect();
			let next_char = text[i + self.order];

			// Get or create the state for this context
			self.states
				.entry(context)
				.or_insert_with(State::new)
				.add_transition(next_char);
		}
	}

	/// Returns the state of `context`, if it was observed.
	pub fn get(&self, context: &str) -> Option<&State> {
		self.states.get(context)
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Total number of recorded pairs (sum of all counts).
	pub fn transition_count(&self) -> usize {
		self.states.values().map(State::total).sum()
	}

	/// Returns a random context from the model.
	///
	/// Keys are sorted before picking, so a replayed source always picks the
	/// same context. Returns `None` if the model has no states.
	pub fn random_context<D>(&self, draws: &mut D) -> Option<&str>
	where
		D: UniformSource + ?Sized,
	{
		if self.states.is_empty() {
			return None;
		}

		let mut keys: Vec<&str> = self.states.keys().map(String::as_str).collect();
		keys.sort_unstable();

		let index = ((draws.next_uniform() * keys.len() as f64) as usize).min(keys.len() - 1);
		Some(keys[index])
	}
}
