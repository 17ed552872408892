//! IF-THEN fuzzy rules.

use std::collections::{BTreeMap, HashMap};

use crate::membership::MembershipFunction;
use crate::norm::Norm;

/// A rule mapping named input membership functions to one output function.
///
/// Several functions registered under the same input name are folded with the
/// rule's combinator, so one rule can carry overlapping partial antecedents.
/// Each name holds a single composite whose children are the registrations.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyRule {
    inputs: BTreeMap<String, MembershipFunction>,
    output: MembershipFunction,
    compose: Norm,
}

impl Default for FuzzyRule {
    fn default() -> Self {
        Self::new(Norm::GodelT)
    }
}

impl FuzzyRule {
    pub fn new(compose: Norm) -> Self {
        Self {
            inputs: BTreeMap::new(),
            output: MembershipFunction::empty(),
            compose,
        }
    }

    /// Register `function` as an antecedent for the input called `name`.
    ///
    /// Repeated registrations are appended to one flat composite per name,
    /// folded with the rule's combinator when the rule fires.
    pub fn add_input_membership_function(
        &mut self,
        function: MembershipFunction,
        name: impl Into<String>,
    ) {
        self.inputs
            .entry(name.into())
            .or_insert_with(|| MembershipFunction::composite(None, Vec::new()))
            .add_base_function(function);
    }

    pub fn set_output_membership_function(&mut self, function: MembershipFunction) {
        self.output = function;
    }

    pub fn set_compose_function(&mut self, compose: Norm) {
        self.compose = compose;
    }

    /// Degree to which `inputs` satisfy the antecedents.
    ///
    /// Unknown input names are ignored. If no input matches, the strength is 0
    /// whatever the combinator's identity.
    pub fn firing_strength(&self, inputs: &HashMap<String, f64>) -> f64 {
        let mut strength = self.compose.identity();
        let mut matched = false;
        for (name, function) in &self.inputs {
            if let Some(&value) = inputs.get(name) {
                let degree = function.evaluate_with(value, self.compose);
                strength = self.compose.evaluate(strength, degree);
                matched = true;
            }
        }
        if matched {
            strength
        } else {
            0.0
        }
    }

    /// Fire the rule: a fresh copy of the output function modified by the
    /// firing strength under `transform` (min clips, product scales).
    pub fn evaluate(&self, inputs: &HashMap<String, f64>, transform: Norm) -> MembershipFunction {
        let strength = self.firing_strength(inputs);
        MembershipFunction::combine(
            transform,
            self.output.clone(),
            MembershipFunction::flat(strength),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn speed_rule(compose: Norm) -> FuzzyRule {
        let mut rule = FuzzyRule::new(compose);
        rule.add_input_membership_function(MembershipFunction::triangle(0.0, 0.5, 1.0), "speed");
        rule.set_output_membership_function(MembershipFunction::triangle(0.0, 1.0, 2.0));
        rule
    }

    #[test]
    fn no_matching_inputs_fire_zero() {
        for compose in [Norm::GodelT, Norm::GodelS, Norm::GoguenT] {
            let rule = speed_rule(compose);
            assert_eq!(rule.firing_strength(&inputs(&[("accuracy", 0.5)])), 0.0);
            assert_eq!(rule.firing_strength(&HashMap::new()), 0.0);
            let fired = rule.evaluate(&inputs(&[("accuracy", 0.5)]), Norm::GodelT);
            assert_eq!(fired.evaluate(1.0), 0.0);
        }
    }

    #[test]
    fn unknown_inputs_are_ignored() {
        let rule = speed_rule(Norm::GodelT);
        let strength = rule.firing_strength(&inputs(&[("speed", 0.25), ("accuracy", 0.0)]));
        assert!((strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn clip_and_scale_transforms() {
        let rule = speed_rule(Norm::GodelT);
        let values = inputs(&[("speed", 0.25)]);

        let clipped = rule.evaluate(&values, Norm::GodelT);
        assert!((clipped.evaluate(1.0) - 0.5).abs() < 1e-12);
        assert!((clipped.evaluate(0.25) - 0.25).abs() < 1e-12);

        let scaled = rule.evaluate(&values, Norm::GoguenT);
        assert!((scaled.evaluate(1.0) - 0.5).abs() < 1e-12);
        assert!((scaled.evaluate(0.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn same_name_registrations_are_composed() {
        let mut rule = FuzzyRule::new(Norm::GodelS);
        rule.add_input_membership_function(MembershipFunction::triangle(0.0, 0.25, 0.5), "speed");
        rule.add_input_membership_function(MembershipFunction::triangle(0.5, 0.75, 1.0), "speed");
        rule.set_output_membership_function(MembershipFunction::flat(1.0));

        assert_eq!(rule.firing_strength(&inputs(&[("speed", 0.25)])), 1.0);
        assert_eq!(rule.firing_strength(&inputs(&[("speed", 0.75)])), 1.0);
    }

    #[test]
    fn repeated_registrations_stay_flat() {
        let mut rule = FuzzyRule::new(Norm::GodelS);
        for i in 0..50 {
            let peak = i as f64 / 50.0;
            rule.add_input_membership_function(
                MembershipFunction::triangle(peak - 0.01, peak, peak + 0.01),
                "speed",
            );
        }
        let speed = &rule.inputs["speed"];
        assert_eq!(speed.children().len(), 50);
        assert!(speed.children().iter().all(|c| c.children().is_empty()));
        assert_eq!(rule.firing_strength(&inputs(&[("speed", 0.5)])), 1.0);

        rule.set_compose_function(Norm::GodelT);
        assert_eq!(rule.firing_strength(&inputs(&[("speed", 0.5)])), 0.0);
    }

    #[test]
    fn multiple_antecedents_fold_from_identity() {
        let mut rule = FuzzyRule::new(Norm::GoguenT);
        rule.add_input_membership_function(MembershipFunction::flat(0.5), "a");
        rule.add_input_membership_function(MembershipFunction::flat(0.4), "b");
        let strength = rule.firing_strength(&inputs(&[("a", 0.0), ("b", 0.0)]));
        assert!((strength - 0.2).abs() < 1e-12);

        rule.set_compose_function(Norm::GodelS);
        assert_eq!(rule.firing_strength(&inputs(&[("a", 0.0), ("b", 0.0)])), 0.5);
    }

    #[test]
    fn evaluate_leaves_rule_untouched() {
        let rule = speed_rule(Norm::GodelT);
        let before = rule.clone();
        let _ = rule.evaluate(&inputs(&[("speed", 0.5)]), Norm::GoguenT);
        assert_eq!(rule, before);
    }
}
