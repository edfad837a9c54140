//! Field validation engine.
//!
//! Declarative per-field rules and a pure-logic evaluator used by the
//! wizard's step gates. Nothing here touches the network.

pub mod evaluator;
pub mod rules;

pub use evaluator::evaluate_fields;
pub use rules::{FieldRule, FieldSpec, FieldViolation, ValidationResult};
