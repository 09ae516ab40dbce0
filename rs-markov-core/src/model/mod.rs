//! Top-level module for the Markov chain model.
//!
//! This module provides:
//! - Per-context transition counts (`State`)
//! - Fixed-order context models (`NGramModel`)
//! - The multi-order table built from a corpus (`ContextTable`)
//! - Pluggable uniform randomness (`UniformSource`, `ScriptedDraws`)
//! - Validated generation parameters (`GenerationInput`)
//! - The generation loops and the high-level `Generator`

/// Generation loops (spaces allowed / spaces refused) and the `Generator`
/// wrapper handling seeding and start selection.
pub mod generator;

/// Multi-order context table, built once from a training text.
pub mod context_table;

/// Fixed-order context model (`n >= 1`).
///
/// Handles text scanning and transition counting for one context length.
pub mod ngram_model;

/// Single context with its insertion-ordered successor counts and the
/// probability-gated selection rule.
pub mod state;

/// Uniform `[0, 1)` sources used by generation.
pub mod draws;

/// Generation parameters: probability threshold, target length, policy,
/// start sequence, seed and stall limit.
pub mod generation_input;
