use indexmap::IndexMap;

use super::draws::UniformSource;

/// Represents a context in the table.
///
/// A `State` is stored under one context substring and holds all observed
/// transitions from this context to the next character.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Select the next character with the probability-gated greedy rule
///
/// ## Invariants
/// - Each transition occurrence count is strictly positive
/// - Transitions iterate in first-seen order
#[derive(Clone, Debug, Default)]
pub struct State {
	/// Outgoing transitions indexed by the next character, in first-seen order.
	/// Example: { 'e' => 42, 'a' => 3 }
	transitions: IndexMap<char, usize>,
}

impl State {
	/// Creates a new empty state.
	pub fn new() -> Self {
		Self { transitions: IndexMap::new() }
	}

	/// Records an occurrence of a transition toward `next_char`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new transition is appended with an initial count of 1.
	pub fn add_transition(&mut self, next_char: char) {
		*self.transitions.entry(next_char).or_insert(0) += 1;
	}

	/// Occurrence count of `next_char`, if it was ever observed.
	pub fn count(&self, next_char: char) -> Option<usize> {
		self.transitions.get(&next_char).copied()
	}

	/// Transitions in first-seen order.
	pub fn transitions(&self) -> impl Iterator<Item = (char, usize)> + '_ {
		self.transitions.iter().map(|(c, occurrence)| (*c, *occurrence))
	}

	/// Sum of all occurrence counts.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Selects the next character with the probability-gated greedy rule.
	///
	/// Transitions are scanned in first-seen order with a running best count
	/// starting at 0. Every candidate consumes one fresh draw, and becomes the
	/// new best only if its count is strictly greater than the best so far
	/// *and* its draw is below `probability`. With `exclude_space`, a space
	/// candidate is never accepted (its draw is still consumed).
	///
	/// Returns `None` when no candidate passed both gates.
	///
	/// # Notes
	/// - Equal counts never replace the incumbent, so ties go to the
	///   first-seen character.
	/// - A frequent character can lose its draw and leave the slot to a rarer
	///   one scanned later.
	pub fn select<D>(&self, probability: f64, exclude_space: bool, draws: &mut D) -> Option<char>
	where
		D: UniformSource + ?Sized,
	{
		let mut max_count = 0;
		let mut selected = None;

		for (next_char, occurrence) in &self.transitions {
			let accepted = draws.next_uniform() < probability;
			if *occurrence > max_count && accepted && !(exclude_space && *next_char == ' ') {
				max_count = *occurrence;
				selected = Some(*next_char);
			}
		}

		selected
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::draws::ScriptedDraws;

	fn state(chars: &str) -> State {
		let mut state = State::new();
		for c in chars.chars() {
			state.add_transition(c);
		}
		state
	}

	#[test]
	fn transitions_keep_first_seen_order() {
		let s = state("zbzab");
		let order: Vec<_> = s.transitions().collect();
		assert_eq!(order, vec![('z', 2), ('b', 2), ('a', 1)]);
		assert_eq!(s.total(), 5);
		assert_eq!(s.count('q'), None);
	}

	#[test]
	fn greedy_at_full_probability_keeps_first_of_ties() {
		let s = state("xyyxz");
		let mut draws = ScriptedDraws::constant(0.0);
		assert_eq!(s.select(1.0, false, &mut draws), Some('x'));
		assert_eq!(draws.consumed(), 3);
	}

	#[test]
	fn strictly_greater_count_replaces_incumbent() {
		let s = state("xyy");
		assert_eq!(s.select(1.0, false, &mut ScriptedDraws::constant(0.0)), Some('y'));
	}

	#[test]
	fn rejected_draw_falls_back_to_later_candidate() {
		// 'x' (3) loses its draw, 'y' (1) passes.
		let s = state("xxxy");
		let mut draws = ScriptedDraws::new([0.9, 0.1]);
		assert_eq!(s.select(0.5, false, &mut draws), Some('y'));
	}

	#[test]
	fn gate_applies_to_every_candidate() {
		// 'x' accepted first, 'y' has a higher count but loses its draw.
		let s = state("xyy");
		let mut draws = ScriptedDraws::new([0.1, 0.9]);
		assert_eq!(s.select(0.5, false, &mut draws), Some('x'));
	}

	#[test]
	fn nothing_selected_when_every_draw_fails() {
		let s = state("xyz");
		let mut draws = ScriptedDraws::constant(0.99);
		assert_eq!(s.select(0.5, false, &mut draws), None);
		assert_eq!(draws.consumed(), 3);
	}

	#[test]
	fn space_is_skipped_but_still_drawn() {
		let s = state("  x");
		let mut draws = ScriptedDraws::constant(0.0);
		assert_eq!(s.select(1.0, true, &mut draws), Some('x'));
		assert_eq!(draws.consumed(), 2);

		let only_space = state(" ");
		assert_eq!(only_space.select(1.0, true, &mut ScriptedDraws::constant(0.0)), None);
		assert_eq!(only_space.select(1.0, false, &mut ScriptedDraws::constant(0.0)), Some(' '));
	}
}
