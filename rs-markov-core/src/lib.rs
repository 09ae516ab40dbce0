//! Character-level Markov chain word generation library.
//!
//! This crate provides a small n-gram text model including:
//! - Multi-order context tables built from a training corpus
//! - Probability-gated greedy generation (with and without spaces)
//! - Pluggable uniform randomness for reproducible generation
//! - Corpus loading and path helpers
//!
//! The two core operations are [`ContextTable::build`] and the free functions
//! [`model::generator::generate`] / [`model::generator::generate_no_space`].
//! [`Generator`] wraps them with validated inputs for binaries.

/// Context tables and generation logic.
pub mod model;

/// I/O utilities (corpus loading, path helpers).
pub mod io;

/// Error type shared by the caller-facing layer.
pub mod error;

pub use error::{ModelError, ModelResult};
pub use model::context_table::{ContextTable, TableStats};
pub use model::draws::{ScriptedDraws, UniformSource};
pub use model::generation_input::{GenerationInput, Policy, StartSeed};
pub use model::generator::{generate, generate_no_space, Generator};
