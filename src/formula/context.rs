//! Evaluation contexts: the full binding set available at one timestamp.
//!
//! A [`ContextBuilder`] resolves each track's evaluation order once, then
//! produces an [`EvaluationContext`] per timestamp. Every formula value becomes
//! visible to formulas later in the order, never to earlier ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cache::FormulaCache;
use super::error::FormulaError;
use super::eval::Bindings;
use super::resolver::resolve_order;
use super::{binding_name, Formula, FormulaSet, TIME_VAR};

/// How many tracks contribute bindings to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Only the rendered track's formulas, under bare names.
    #[default]
    Single,
    /// Every track's formulas under `t<index>.<name>`, plus the rendered
    /// track's own bare names.
    Multi,
}

/// The namespaced binding for `binding` on track `track`.
pub fn namespaced(track: usize, binding: &str) -> String {
    format!("t{track}.{binding}")
}

/// Immutable name → value map for one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    values: HashMap<String, f64>,
}

impl EvaluationContext {
    /// A context holding only the time variable.
    pub fn at_millis(millis: u64) -> Self {
        let mut values = HashMap::new();
        values.insert(TIME_VAR.to_string(), millis as f64 / 1000.0);
        Self { values }
    }

    /// The time variable, in seconds.
    pub fn time(&self) -> f64 {
        self.values.get(TIME_VAR).copied().unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a track parameter by its parameter name (`grain start`).
    pub fn param(&self, param: &str) -> Result<f64, FormulaError> {
        let binding = binding_name(param);
        self.get(&binding)
            .ok_or_else(|| FormulaError::unbound(&binding, param, 0))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Bindings for EvaluationContext {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name)
    }
}

/// One track's formulas in evaluation order, or the reason they have none.
#[derive(Debug, Clone)]
struct TrackPlan {
    index: usize,
    ordered: Result<Vec<(String, Formula)>, FormulaError>,
}

impl TrackPlan {
    fn new(index: usize, formulas: &FormulaSet) -> Self {
        let ordered = resolve_order(formulas).and_then(|order| {
            order
                .into_iter()
                .map(|name| {
                    let text = formulas.get(&name).unwrap_or_default();
                    Ok((binding_name(&name), Formula::parse(text)?))
                })
                .collect::<Result<Vec<_>, FormulaError>>()
        });
        Self { index, ordered }
    }

    /// Evaluate every formula in order, inserting bare names into `values`.
    fn evaluate_into(
        &self,
        values: &mut HashMap<String, f64>,
        time: f64,
        cache: &mut FormulaCache,
    ) -> Result<(), FormulaError> {
        let ordered = self.ordered.as_ref().map_err(Clone::clone)?;
        for (binding, formula) in ordered {
            let value = cache.get_or_eval(self.index, formula, time, &*values)?;
            values.insert(binding.clone(), value);
        }
        Ok(())
    }

    fn bindings(&self) -> impl Iterator<Item = &str> {
        self.ordered
            .as_ref()
            .map(|o| o.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|(b, _)| b.as_str())
    }
}

/// Builds [`EvaluationContext`]s for one or more tracks.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    mode: ContextMode,
    plans: Vec<TrackPlan>,
}

impl ContextBuilder {
    /// Builder over a single track's formulas. `index` scopes cache entries.
    pub fn single(index: usize, formulas: &FormulaSet) -> Self {
        Self {
            mode: ContextMode::Single,
            plans: vec![TrackPlan::new(index, formulas)],
        }
    }

    /// Builder over every track, in list order.
    pub fn multi<'a>(tracks: impl IntoIterator<Item = &'a FormulaSet>) -> Self {
        Self {
            mode: ContextMode::Multi,
            plans: tracks
                .into_iter()
                .enumerate()
                .map(|(i, f)| TrackPlan::new(i, f))
                .collect(),
        }
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    /// The resolution error for track `index`, if its formulas cannot be ordered.
    pub fn plan_error(&self, index: usize) -> Option<&FormulaError> {
        self.plans
            .iter()
            .find(|p| p.index == index)
            .and_then(|p| p.ordered.as_ref().err())
    }

    /// Build the context for track `focus` at `millis`.
    pub fn build(
        &self,
        focus: usize,
        millis: u64,
        cache: &mut FormulaCache,
    ) -> Result<EvaluationContext, FormulaError> {
        let mut ctx = EvaluationContext::at_millis(millis);
        let time = ctx.time();

        match self.mode {
            ContextMode::Single => {
                let plan = self
                    .plans
                    .iter()
                    .find(|p| p.index == focus)
                    .ok_or_else(|| FormulaError::unknown_parameter(&format!("track {focus}")))?;
                plan.evaluate_into(&mut ctx.values, time, cache)?;
            }
            ContextMode::Multi => {
                let mut own = None;
                for plan in &self.plans {
                    let mut local = ctx.values.clone();
                    match plan.evaluate_into(&mut local, time, cache) {
                        Ok(()) => {
                            for binding in plan.bindings() {
                                if let Some(&value) = local.get(binding) {
                                    ctx.values.insert(namespaced(plan.index, binding), value);
                                }
                            }
                            if plan.index == focus {
                                own = Some(local);
                            }
                        }
                        Err(e) if plan.index == focus => return Err(e),
                        Err(e) => {
                            debug!(track = plan.index, error = %e, "track left out of shared context");
                        }
                    }
                }
                if let Some(own) = own {
                    for plan in self.plans.iter().filter(|p| p.index == focus) {
                        for binding in plan.bindings() {
                            if let Some(&value) = own.get(binding) {
                                ctx.values.insert(binding.to_string(), value);
                            }
                        }
                    }
                }
            }
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{CachePolicy, ErrorKind};

    fn set(entries: &[(&str, &str)]) -> FormulaSet {
        entries.iter().copied().collect()
    }

    #[test]
    fn time_variable_in_seconds() {
        let ctx = EvaluationContext::at_millis(2500);
        assert_eq!(ctx.time(), 2.5);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn single_track_values_in_dependency_order() {
        let formulas = set(&[("amplitude", "rhythm * 2"), ("rhythm", "(x + 5) / 10")]);
        let builder = ContextBuilder::single(0, &formulas);
        let mut cache = FormulaCache::default();
        let ctx = builder.build(0, 5000, &mut cache).unwrap();
        assert_eq!(ctx.get("rhythm"), Some(1.0));
        assert_eq!(ctx.get("amplitude"), Some(2.0));
        assert_eq!(ctx.param("amplitude").unwrap(), 2.0);
    }

    #[test]
    fn spaced_parameter_lookup() {
        let formulas = set(&[("grain start", "x * 10")]);
        let builder = ContextBuilder::single(0, &formulas);
        let ctx = builder.build(0, 1000, &mut FormulaCache::default()).unwrap();
        assert_eq!(ctx.param("grain start").unwrap(), 10.0);
        assert_eq!(ctx.get("grain_start"), Some(10.0));
    }

    #[test]
    fn cycle_fails_build() {
        let formulas = set(&[("a", "b"), ("b", "a")]);
        let builder = ContextBuilder::single(0, &formulas);
        assert!(builder.plan_error(0).is_some());
        let err = builder.build(0, 0, &mut FormulaCache::default()).unwrap_err();
        assert!(err.is_cyclic());
    }

    #[test]
    fn missing_binding_fails_build() {
        let formulas = set(&[("a", "y + 1")]);
        let builder = ContextBuilder::single(0, &formulas);
        let err = builder.build(0, 0, &mut FormulaCache::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnboundIdentifier("y".into()));
    }

    #[test]
    fn multi_track_namespaces_values() {
        let first = set(&[("rhythm", "2")]);
        let second = set(&[("rhythm", "t0.rhythm * 3"), ("amplitude", "rhythm + 1")]);
        let builder = ContextBuilder::multi([&first, &second]);
        let mut cache = FormulaCache::new(CachePolicy::Enabled);

        let ctx = builder.build(1, 0, &mut cache).unwrap();
        assert_eq!(ctx.get("t0.rhythm"), Some(2.0));
        assert_eq!(ctx.get("t1.rhythm"), Some(6.0));
        assert_eq!(ctx.get("t1.amplitude"), Some(7.0));
        // Bare names belong to the focused track.
        assert_eq!(ctx.get("rhythm"), Some(6.0));
        assert_eq!(ctx.get("amplitude"), Some(7.0));

        let ctx = builder.build(0, 0, &mut cache).unwrap();
        assert_eq!(ctx.get("rhythm"), Some(2.0));
        assert_eq!(ctx.get("amplitude"), None);
    }

    #[test]
    fn multi_track_forward_reference_is_unbound() {
        let first = set(&[("rhythm", "t1.rhythm")]);
        let second = set(&[("rhythm", "1")]);
        let builder = ContextBuilder::multi([&first, &second]);
        let mut cache = FormulaCache::default();

        let err = builder.build(0, 0, &mut cache).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnboundIdentifier("t1.rhythm".into()));

        // The broken track does not stop the other one.
        let ctx = builder.build(1, 0, &mut cache).unwrap();
        assert_eq!(ctx.get("rhythm"), Some(1.0));
        assert_eq!(ctx.get("t0.rhythm"), None);
    }

    #[test]
    fn cache_reused_across_builds() {
        let formulas = set(&[("a", "x + 1")]);
        let builder = ContextBuilder::single(0, &formulas);
        let mut cache = FormulaCache::default();
        builder.build(0, 100, &mut cache).unwrap();
        builder.build(0, 100, &mut cache).unwrap();
        assert_eq!(cache.hits(), 1);
    }
}
