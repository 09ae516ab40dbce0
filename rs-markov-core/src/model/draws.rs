use std::collections::VecDeque;

use rand::Rng;

/// A source of independent uniform draws in `[0, 1)`.
///
/// Generation consumes exactly one draw per candidate character per
/// iteration, so any implementation that replays the same values produces
/// the same words.
pub trait UniformSource {
	/// Returns the next draw, in `[0, 1)`.
	fn next_uniform(&mut self) -> f64;
}

/// Every `rand` generator is a uniform source.
impl<R: Rng + ?Sized> UniformSource for R {
	fn next_uniform(&mut self) -> f64 {
		self.random::<f64>()
	}
}

/// Replays a fixed script of draws, then a fallback value forever.
///
/// Used to inject exact acceptance decisions into generation, e.g.
/// `ScriptedDraws::new([0.9, 0.1])` rejects the first candidate and accepts
/// the second one for any probability in `(0.1, 0.9]`.
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
	script: VecDeque<f64>,
	fallback: f64,
	consumed: usize,
}

impl ScriptedDraws {
	/// Creates a script falling back to `0.0` (always accepted) once exhausted.
	pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
		Self::with_fallback(draws, 0.0)
	}

	/// Creates a script falling back to `fallback` once exhausted.
	pub fn with_fallback<I: IntoIterator<Item = f64>>(draws: I, fallback: f64) -> Self {
		Self {
			script: draws.into_iter().collect(),
			fallback,
			consumed: 0,
		}
	}

	/// A source whose every draw is `value`.
	pub fn constant(value: f64) -> Self {
		Self::with_fallback([], value)
	}

	/// Number of draws handed out so far.
	pub fn consumed(&self) -> usize {
		self.consumed
	}
}

impl UniformSource for ScriptedDraws {
	fn next_uniform(&mut self) -> f64 {
		self.consumed += 1;
		self.script.pop_front().unwrap_or(self.fallback)
	}
}
