//! Feature bit evaluation engine.
//!
//! The evaluator answers "is this feature enabled for this caller" against a
//! snapshot of all definitions fetched once at construction time. It never
//! re-fetches and never mutates the snapshot, so a single instance can serve
//! concurrent read-only queries.
//!
//! # Example
//!
//! ```no_run
//! use flagbit_core::{EvaluationContext, FeatureBitEvaluator, FeatureBitRepository};
//!
//! async fn check(repo: &dyn FeatureBitRepository) -> flagbit_domain::Result<bool> {
//!     let evaluator =
//!         FeatureBitEvaluator::from_repository(repo, EvaluationContext::from_env()).await?;
//!     evaluator.is_enabled_with_permission(1, 20)
//! }
//! ```

use flagbit_domain::{FeatureBitDefinition, FlagbitError, Result};
use tracing::debug;

use crate::dependencies::split_names;
use crate::ports::FeatureBitRepository;

/// Maximum depth walked through a dependency chain.
///
/// Reaching the ceiling stops the walk without forcing the feature off.
/// This is a defensive guard against cyclic dependency data rather than a
/// sound cycle detector: chains longer than the ceiling are silently
/// truncated at evaluation time and rejected at write time.
pub const MAX_DEPENDENCY_DEPTH: u32 = 3;

/// Environment variable consulted by [`EvaluationContext::from_env`].
pub const ENVIRONMENT_VAR: &str = "FLAGBIT_ENVIRONMENT";

/// Runtime inputs for evaluation, passed in explicitly instead of read from
/// process-wide state.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    current_environment: Option<String>,
}

impl EvaluationContext {
    /// Create a context with a known current environment name.
    pub fn new(environment: impl Into<String>) -> Self {
        Self { current_environment: Some(environment.into()) }
    }

    /// Create a context from the `FLAGBIT_ENVIRONMENT` variable.
    ///
    /// A missing variable leaves the environment unset, in which case no
    /// environment list ever matches.
    pub fn from_env() -> Self {
        Self { current_environment: std::env::var(ENVIRONMENT_VAR).ok() }
    }

    /// The current environment name, when known.
    pub fn current_environment(&self) -> Option<&str> {
        self.current_environment.as_deref()
    }

    /// Case-insensitive membership test against a comma-separated list.
    fn environment_in(&self, list: &str) -> bool {
        let Some(current) = self.current_environment.as_deref() else {
            return false;
        };
        split_names(Some(list)).iter().any(|entry| entry.eq_ignore_ascii_case(current))
    }
}

/// Decides ON/OFF for feature bits against an in-memory snapshot.
pub struct FeatureBitEvaluator {
    definitions: Vec<FeatureBitDefinition>,
    context: EvaluationContext,
}

impl FeatureBitEvaluator {
    /// Create an evaluator over an already-loaded snapshot.
    pub fn new(definitions: Vec<FeatureBitDefinition>, context: EvaluationContext) -> Self {
        Self { definitions, context }
    }

    /// Create an evaluator by fetching all definitions from the repository.
    ///
    /// This is the only I/O the evaluator ever performs; every query
    /// afterwards is pure computation over the snapshot.
    pub async fn from_repository(
        repo: &dyn FeatureBitRepository,
        context: EvaluationContext,
    ) -> Result<Self> {
        let definitions = repo.get_all().await?;
        debug!(count = definitions.len(), "feature bit snapshot loaded");
        Ok(Self::new(definitions, context))
    }

    /// Borrow the loaded snapshot.
    pub fn definitions(&self) -> &[FeatureBitDefinition] {
        &self.definitions
    }

    /// Determine whether a feature is enabled for an anonymous caller
    /// (permission level 0).
    pub fn is_enabled(&self, feature: i32) -> Result<bool> {
        self.is_enabled_with_permission(feature, 0)
    }

    /// Determine whether a feature is enabled for a caller with the given
    /// permission level.
    ///
    /// Fails with `NotFound` when no definition in the snapshot has the
    /// requested id; a missing feature is never silently "off".
    pub fn is_enabled_with_permission(&self, feature: i32, permission_level: i32) -> Result<bool> {
        let definition = self
            .definitions
            .iter()
            .find(|d| d.id == feature)
            .ok_or_else(|| FlagbitError::NotFound(format!("unable to find feature {feature}")))?;

        let enabled = self.evaluate(definition, permission_level, 0)?;
        debug!(feature, permission_level, enabled, "feature bit evaluated");
        Ok(enabled)
    }

    /// Evaluate a batch of feature keys, in input order.
    ///
    /// Each key is evaluated independently; the first failure aborts the
    /// batch (there is no partial-results contract).
    pub fn evaluate_many(
        &self,
        features: &[i32],
        permission_level: i32,
    ) -> Result<Vec<(i32, bool)>> {
        features
            .iter()
            .map(|&feature| {
                self.is_enabled_with_permission(feature, permission_level)
                    .map(|enabled| (feature, enabled))
            })
            .collect()
    }

    /// Evaluate one definition: base precedence rules ANDed with the
    /// dependency gate. Every dependency name is resolved even when the
    /// base decision is already off, so a dangling name is always an error.
    fn evaluate(
        &self,
        definition: &FeatureBitDefinition,
        permission_level: i32,
        depth: u32,
    ) -> Result<bool> {
        let enabled = self.base_state(definition, permission_level);

        // Depth ceiling reached: stop walking and treat the branch as
        // non-blocking so cyclic data cannot loop forever.
        if depth >= MAX_DEPENDENCY_DEPTH {
            return Ok(enabled);
        }

        let mut dependencies_enabled = true;
        for name in split_names(definition.dependencies.as_deref()) {
            let dependency = self.definitions.iter().find(|d| d.name == name).ok_or_else(|| {
                FlagbitError::NotFound(format!("unable to find feature '{name}'"))
            })?;
            if !self.evaluate(dependency, permission_level, depth + 1)? {
                dependencies_enabled = false;
            }
        }
        Ok(enabled && dependencies_enabled)
    }

    /// Base decision, before the dependency gate. First matching rule wins:
    /// exclusion, inclusion, exact permission, minimum permission, on/off.
    fn base_state(&self, definition: &FeatureBitDefinition, permission_level: i32) -> bool {
        if let Some(excluded) = non_empty(definition.excluded_environments.as_deref()) {
            if self.context.environment_in(excluded) {
                return false;
            }
        }

        if let Some(included) = non_empty(definition.included_environments.as_deref()) {
            return self.context.environment_in(included);
        }

        if permission_level > 0 {
            if let Some(exact) =
                definition.exact_allowed_permission_level.filter(|&level| level != 0)
            {
                return permission_level == exact;
            }
        }

        if definition.minimum_allowed_permission_level > 0 {
            return permission_level >= definition.minimum_allowed_permission_level;
        }

        definition.on_off
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn definition(id: i32, name: &str) -> FeatureBitDefinition {
        let now = Utc::now();
        FeatureBitDefinition {
            id,
            name: name.to_string(),
            on_off: false,
            excluded_environments: None,
            included_environments: None,
            minimum_allowed_permission_level: 0,
            exact_allowed_permission_level: None,
            allowed_users: None,
            dependencies: None,
            created_date_time: now,
            created_by_user: "tester".into(),
            last_modified_date_time: now,
            last_modified_by_user: "tester".into(),
        }
    }

    fn evaluator(definitions: Vec<FeatureBitDefinition>) -> FeatureBitEvaluator {
        FeatureBitEvaluator::new(definitions, EvaluationContext::default())
    }

    fn evaluator_in(env: &str, definitions: Vec<FeatureBitDefinition>) -> FeatureBitEvaluator {
        FeatureBitEvaluator::new(definitions, EvaluationContext::new(env))
    }

    #[test]
    fn on_off_is_the_fallback_rule() {
        let mut on = definition(1, "on");
        on.on_off = true;
        let off = definition(2, "off");

        let eval = evaluator(vec![on, off]);
        assert!(eval.is_enabled(1).expect("feature 1 exists"));
        assert!(!eval.is_enabled(2).expect("feature 2 exists"));
    }

    #[test]
    fn unknown_feature_key_is_an_error_naming_the_key() {
        let mut def = definition(1, "only");
        def.on_off = true;
        let eval = evaluator(vec![def]);

        let err = eval.is_enabled(0).expect_err("feature 0 does not exist");
        assert!(matches!(err, FlagbitError::NotFound(_)));
        assert!(err.to_string().contains('0'));
    }

    #[test]
    fn excluded_environment_forces_off() {
        let mut def = definition(0, "feature");
        def.on_off = true;
        def.excluded_environments = Some("LocalDevelopment".into());

        let eval = evaluator_in("LocalDevelopment", vec![def]);
        assert!(!eval.is_enabled(0).expect("feature exists"));
    }

    #[test]
    fn exclusion_compare_is_case_insensitive() {
        let mut def = definition(0, "feature");
        def.on_off = true;
        def.excluded_environments = Some("production".into());

        let eval = evaluator_in("PRODUCTION", vec![def]);
        assert!(!eval.is_enabled(0).expect("feature exists"));
    }

    #[test]
    fn exclusion_beats_minimum_permission_and_dependencies() {
        let mut dep = definition(2, "dep");
        dep.on_off = true;
        let mut def = definition(1, "feature");
        def.on_off = true;
        def.minimum_allowed_permission_level = 1;
        def.dependencies = Some("dep".into());
        def.excluded_environments = Some("QA".into());

        let eval = evaluator_in("QA", vec![def, dep]);
        assert!(!eval.is_enabled_with_permission(1, 99).expect("feature exists"));
    }

    #[test]
    fn non_excluded_environment_falls_through_to_other_rules() {
        let mut def = definition(0, "feature");
        def.excluded_environments = Some("Production".into());
        def.on_off = false;

        let eval = evaluator_in("QA", vec![def]);
        assert!(!eval.is_enabled(0).expect("feature exists"), "on_off still applies");
    }

    #[test]
    fn included_environments_override_on_off() {
        let mut def = definition(0, "feature");
        def.on_off = true;
        def.included_environments = Some("Production,Staging".into());

        let eval = evaluator_in("QA", vec![def.clone()]);
        assert!(!eval.is_enabled(0).expect("feature exists"), "absent from inclusion list");

        let eval = evaluator_in("staging", vec![def]);
        assert!(eval.is_enabled(0).expect("feature exists"), "case-insensitive member");
    }

    #[test]
    fn inclusion_without_known_environment_is_off() {
        let mut def = definition(0, "feature");
        def.on_off = true;
        def.included_environments = Some("Production".into());

        let eval = evaluator(vec![def]);
        assert!(!eval.is_enabled(0).expect("feature exists"));
    }

    #[test]
    fn exact_permission_level_overrides_minimum() {
        let mut def = definition(0, "feature");
        def.exact_allowed_permission_level = Some(30);
        def.minimum_allowed_permission_level = 20;

        let eval = evaluator(vec![def]);
        assert!(eval.is_enabled_with_permission(0, 30).expect("feature exists"));
        assert!(
            !eval.is_enabled_with_permission(0, 20).expect("feature exists"),
            "exact mismatch overrides a satisfied minimum"
        );
    }

    #[test]
    fn exact_rule_is_skipped_for_anonymous_callers() {
        let mut def = definition(0, "feature");
        def.exact_allowed_permission_level = Some(30);
        def.minimum_allowed_permission_level = 20;

        let eval = evaluator(vec![def]);
        // Level 0 skips the exact rule and fails the minimum instead.
        assert!(!eval.is_enabled(0).expect("feature exists"));
    }

    #[test]
    fn minimum_permission_level_is_a_threshold() {
        let mut def = definition(0, "feature");
        def.minimum_allowed_permission_level = 10;

        let eval = evaluator(vec![def]);
        assert!(!eval.is_enabled_with_permission(0, 9).expect("feature exists"));
        assert!(eval.is_enabled_with_permission(0, 10).expect("feature exists"));
        assert!(eval.is_enabled_with_permission(0, 11).expect("feature exists"));
    }

    #[test]
    fn disabled_dependency_forces_feature_off() {
        let mut parent = definition(1, "parent");
        parent.on_off = true;
        parent.dependencies = Some("child".into());
        let child = definition(2, "child"); // on_off = false

        let eval = evaluator(vec![parent, child]);
        assert!(!eval.is_enabled(1).expect("feature exists"));
    }

    #[test]
    fn all_enabled_dependencies_keep_feature_on() {
        let mut parent = definition(1, "parent");
        parent.on_off = true;
        parent.dependencies = Some("a,b".into());
        let mut a = definition(2, "a");
        a.on_off = true;
        let mut b = definition(3, "b");
        b.on_off = true;

        let eval = evaluator(vec![parent, a, b]);
        assert!(eval.is_enabled(1).expect("feature exists"));
    }

    #[test]
    fn missing_dependency_name_is_an_error() {
        let mut parent = definition(1, "parent");
        parent.on_off = true;
        parent.dependencies = Some("ghost".into());

        let eval = evaluator(vec![parent]);
        let err = eval.is_enabled(1).expect_err("dependency missing");
        assert!(matches!(err, FlagbitError::NotFound(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn missing_dependency_name_is_an_error_even_when_base_is_off() {
        let mut parent = definition(1, "parent");
        parent.on_off = false;
        parent.dependencies = Some("ghost".into());

        let eval = evaluator(vec![parent]);
        let err = eval.is_enabled(1).expect_err("dangling name is never masked");
        assert!(matches!(err, FlagbitError::NotFound(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn cyclic_dependencies_terminate_at_the_ceiling() {
        let mut a = definition(1, "a");
        a.on_off = true;
        a.dependencies = Some("b".into());
        let mut b = definition(2, "b");
        b.on_off = true;
        b.dependencies = Some("a".into());

        let eval = evaluator(vec![a, b]);
        // The walk is truncated at MAX_DEPENDENCY_DEPTH and the truncated
        // branch does not force the result off.
        assert!(eval.is_enabled(1).expect("feature exists"));
    }

    #[test]
    fn deep_chain_is_truncated_not_failed() {
        // a -> b -> c -> d -> e where e is off, but e sits past the ceiling.
        let names = ["a", "b", "c", "d", "e"];
        let mut defs: Vec<FeatureBitDefinition> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut def = definition(i as i32 + 1, name);
                def.on_off = true;
                if i + 1 < names.len() {
                    def.dependencies = Some(names[i + 1].to_string());
                }
                def
            })
            .collect();
        defs[4].on_off = false;

        let eval = evaluator(defs);
        assert!(eval.is_enabled(1).expect("feature exists"), "branch past the ceiling is ignored");
    }

    #[test]
    fn dependency_within_the_ceiling_still_gates() {
        // a -> b -> c, c off: well within the ceiling, must propagate.
        let mut a = definition(1, "a");
        a.on_off = true;
        a.dependencies = Some("b".into());
        let mut b = definition(2, "b");
        b.on_off = true;
        b.dependencies = Some("c".into());
        let c = definition(3, "c");

        let eval = evaluator(vec![a, b, c]);
        assert!(!eval.is_enabled(1).expect("feature exists"));
    }

    #[test]
    fn dependencies_are_evaluated_at_the_caller_permission_level() {
        let mut parent = definition(1, "parent");
        parent.on_off = true;
        parent.dependencies = Some("gated".into());
        let mut gated = definition(2, "gated");
        gated.minimum_allowed_permission_level = 10;

        let eval = evaluator(vec![parent, gated]);
        assert!(!eval.is_enabled_with_permission(1, 5).expect("feature exists"));
        assert!(eval.is_enabled_with_permission(1, 10).expect("feature exists"));
    }

    #[test]
    fn evaluate_many_preserves_input_order() {
        let mut on = definition(1, "on");
        on.on_off = true;
        let off = definition(2, "off");

        let eval = evaluator(vec![on, off]);
        let states = eval.evaluate_many(&[2, 1], 0).expect("both features exist");
        assert_eq!(states, vec![(2, false), (1, true)]);
    }

    #[test]
    fn evaluate_many_aborts_on_first_missing_key() {
        let mut on = definition(1, "on");
        on.on_off = true;

        let eval = evaluator(vec![on]);
        let err = eval.evaluate_many(&[1, 42], 0).expect_err("second key missing");
        assert!(err.to_string().contains("42"));
    }
}
