//! Ordered, caller-owned list of configured rule instances.

use polars::prelude::DataFrame;

use parity_model::{ConfigError, RuleInstance, RuleKind};

use crate::catalog::template_rules;

/// Rule instances in configuration order.
///
/// The store is a plain owned value: callers mutate it through `add`,
/// `remove` and `clear`, and hand the engine a borrowed snapshot via
/// [`RuleStore::as_slice`].
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<RuleInstance>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already validated rule instance.
    pub fn add(&mut self, rule: RuleInstance) {
        self.rules.push(rule);
    }

    /// Validate a configuration and append it.
    ///
    /// Nothing is added when the configuration is rejected.
    pub fn add_rule(
        &mut self,
        kind: RuleKind,
        column: Option<&str>,
        reference: Option<DataFrame>,
    ) -> Result<(), ConfigError> {
        let rule = RuleInstance::new(kind, column, reference)?;
        self.rules.push(rule);
        Ok(())
    }

    /// Append the canned tests of a known table.
    ///
    /// Returns the number of rules added (zero for unknown tables). Nothing is
    /// added when any template is rejected.
    pub fn extend_from_templates(&mut self, table: &str) -> Result<usize, ConfigError> {
        let rules = template_rules(table)?;
        let added = rules.len();
        self.rules.extend(rules);
        Ok(added)
    }

    pub fn remove(&mut self, index: usize) -> Option<RuleInstance> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleInstance> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[RuleInstance] {
        &self.rules
    }
}

impl<'a> IntoIterator for &'a RuleStore {
    type Item = &'a RuleInstance;
    type IntoIter = std::slice::Iter<'a, RuleInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl Extend<RuleInstance> for RuleStore {
    fn extend<T: IntoIterator<Item = RuleInstance>>(&mut self, iter: T) {
        self.rules.extend(iter);
    }
}
