use std::collections::BTreeMap;

use log::{debug, trace, warn};
use serde::Serialize;

use super::draws::UniformSource;
use super::ngram_model::NGramModel;
use super::state::State;

/// The trained model: one [`NGramModel`] per context length, from 1 up to
/// `context_length`.
///
/// This struct manages:
/// - `orders`: a map from context length to the model holding every context
///   of that length.
/// - `context_length`: the maximum order the table was built with.
///
/// Contexts of different lengths live in different models, so counts are
/// never merged across lengths. The table is never mutated after
/// [`ContextTable::build`] returns and can be shared freely between readers.
#[derive(Clone, Debug)]
pub struct ContextTable {
	context_length: usize,
	orders: BTreeMap<usize, NGramModel>,
}

/// Size summary of a [`ContextTable`].
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TableStats {
	/// Maximum context length the table was built with.
	pub context_length: usize,
	/// Number of distinct contexts, all orders combined.
	pub contexts: usize,
	/// Number of recorded `(context, next)` pairs, all orders combined.
	pub transitions: usize,
	/// Number of distinct contexts for each order, index 0 being order 1.
	pub contexts_per_order: Vec<usize>,
}

impl ContextTable {
	/// Builds the table from a normalized training text.
	///
	/// For every order from 1 to `context_length`, every start index of the
	/// text is scanned and each `(context, next)` pair fully inside the text
	/// is counted (see [`NGramModel::add_text`] for the exact bound).
	///
	/// # Notes
	/// - Never fails: an empty or too short text gives an empty table.
	/// - A `context_length` of 0 gives an empty table; callers are expected to
	///   validate it (see [`crate::Generator::train`]).
	/// - UTF-8 safe: contexts are measured in characters, not bytes.
	pub fn build(text: &str, context_length: usize) -> Self {
		let chars: Vec<char> = text.chars().collect();
		let mut orders = BTreeMap::new();

		if context_length == 0 {
			warn!("context length 0 requested, building an empty table");
		}

		for order in 1..=context_length {
			let mut model = NGramModel::new(order);
			model.add_text(&chars);
			trace!("order {}: {} contexts", model.order(), model.len());
			if !model.is_empty() {
				orders.insert(model.order(), model);
			}
		}

		let table = Self { context_length, orders };
		debug!(
			"built context table: {} chars, context length {}, {} contexts",
			chars.len(),
			context_length,
			table.orders.values().map(NGramModel::len).sum::<usize>()
		);
		table
	}

	/// Maximum context length the table was built with.
	pub fn context_length(&self) -> usize {
		self.context_length
	}

	/// Returns the frequency mapping of `context`, if it was observed.
	///
	/// The model is selected from the character count of `context`, so the
	/// empty string and contexts longer than `context_length` are never found.
	pub fn get(&self, context: &str) -> Option<&State> {
		self.orders.get(&context.chars().count())?.get(context)
	}

	/// True if `context` is a key of the table.
	pub fn contains(&self, context: &str) -> bool {
		self.get(context).is_some()
	}

	/// How many times `next_char` followed `context` in the training text.
	pub fn count(&self, context: &str, next_char: char) -> Option<usize> {
		self.get(context)?.count(next_char)
	}

	/// True if no context was recorded at all.
	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}

	/// Picks a random context of length `order`.
	///
	/// Returns `None` if the table holds no context of that length.
	pub fn random_context<D>(&self, order: usize, draws: &mut D) -> Option<&str>
	where
		D: UniformSource + ?Sized,
	{
		self.orders.get(&order)?.random_context(draws)
	}

	/// Computes the size summary of the table.
	pub fn stats(&self) -> TableStats {
		let contexts_per_order: Vec<usize> = (1..=self.context_length)
			.map(|order| self.orders.get(&order).map_or(0, NGramModel::len))
			.collect();

		TableStats {
			context_length: self.context_length,
			contexts: contexts_per_order.iter().sum(),
			transitions: self.orders.values().map(NGramModel::transition_count).sum(),
			contexts_per_order,
		}
	}
}
