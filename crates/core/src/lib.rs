//! Repair-job submission core.
//!
//! Pure client-side logic for the multi-step repair-job wizard: field rules
//! and their evaluator, the step gates and wizard state machine, the
//! cascading country/state/city selection with its stale-response guard,
//! the session option cache, and submission payload assembly. Nothing in
//! this crate performs network I/O; see `repairhub-client` for that.

pub mod error;
pub mod form;
pub mod location;
pub mod option_cache;
pub mod payload;
pub mod timeline;
pub mod types;
pub mod validation;
pub mod wizard;
