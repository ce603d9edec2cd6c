//! Rule pack - the ordered rule store the matcher scans.

use serde::{Deserialize, Serialize};

use super::{Rule, RuleId};
use crate::events::ActionName;

/// An ordered collection of rules.
///
/// Rules are appended cheaply with [`RulePack::add_rule`]; [`RulePack::compile`]
/// then computes every rule's priority and sorts the pack so the most specific
/// rules are tried first. The sort is stable, so rules of equal priority keep
/// their definition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePack {
    rules: Vec<Rule>,
    compiled: bool,
}

impl RulePack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. The pack must be compiled again before matching.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.compiled = false;
    }

    /// Compute priorities and sort descending by priority.
    pub fn compile(&mut self) {
        for rule in &mut self.rules {
            rule.priority = rule.specificity();
        }
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.compiled = true;
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(id.0)
    }

    /// Iterate rules in match order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, rule)| (RuleId(i), rule))
    }

    /// Find the rule identified by `(actor, action, object)`.
    pub fn find(&self, actor: &str, action: ActionName, object: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|rule| rule.is_identified_by(actor, action, object))
            .map(RuleId)
    }

    /// Make every rule eligible to fire again.
    pub fn reset_all(&mut self) {
        for rule in &mut self.rules {
            rule.has_run = false;
        }
    }

    /// Number of rules that have fired (or were disabled).
    pub fn fired_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.has_run).count()
    }

    /// Dump the pack as JSON for inspection tools.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
