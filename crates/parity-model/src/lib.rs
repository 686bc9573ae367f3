//! Data model for migration parity validation.
//!
//! A [`RuleInstance`] names a [`RuleKind`] and the column it targets. Evaluating
//! it against a legacy and a migrated dataset yields a [`RuleResult`]; a batch of
//! results is summarised as a [`ValidationRun`].

pub mod error;
pub mod result;
pub mod rule;

pub use error::{ConfigError, EvaluationError, Side};
pub use result::{ObservedValue, RuleResult, RuleStatus, ValidationRun};
pub use rule::{RuleInstance, RuleKind};
