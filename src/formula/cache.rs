//! Memoization of formula results for one render invocation.
//!
//! Results are keyed by `(scope, formula text, time)`. The scope is the track
//! position, so identical text on two tracks with different dependencies never
//! shares an entry. The cache lives as long as the render that owns it; formula
//! edits between renders always start from an empty cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::FormulaError;
use super::eval::Bindings;
use super::Formula;

/// Whether results are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    #[default]
    Enabled,
    Disabled,
}

/// Formula result cache.
#[derive(Debug, Default)]
pub struct FormulaCache {
    policy: CachePolicy,
    entries: HashMap<(usize, u64), HashMap<String, f64>>,
    hits: u64,
    misses: u64,
}

impl FormulaCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Return the cached value for `formula` at `time`, evaluating and storing it on a miss.
    pub fn get_or_eval<B: Bindings + ?Sized>(
        &mut self,
        scope: usize,
        formula: &Formula,
        time: f64,
        bindings: &B,
    ) -> Result<f64, FormulaError> {
        if self.policy == CachePolicy::Disabled {
            self.misses += 1;
            return formula.eval(bindings);
        }

        let key = (scope, time.to_bits());
        if let Some(&value) = self
            .entries
            .get(&key)
            .and_then(|by_text| by_text.get(formula.text()))
        {
            self.hits += 1;
            return Ok(value);
        }

        self.misses += 1;
        let value = formula.eval(bindings)?;
        self.entries
            .entry(key)
            .or_default()
            .insert(formula.text().to_string(), value);
        Ok(value)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored result and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lookup_hits() {
        let mut cache = FormulaCache::new(CachePolicy::Enabled);
        let f = Formula::parse("x * 10").unwrap();
        let a = cache.get_or_eval(0, &f, 1.5, &[("x", 1.5)]).unwrap();
        let b = cache.get_or_eval(0, &f, 1.5, &[("x", 1.5)]).unwrap();
        assert_eq!(a, 15.0);
        assert_eq!(b, 15.0);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn key_ignores_other_bindings() {
        // Same text, same time: the stored value wins even if a dependency changed.
        let mut cache = FormulaCache::new(CachePolicy::Enabled);
        let f = Formula::parse("rhythm * 2").unwrap();
        let first = cache
            .get_or_eval(0, &f, 0.0, &[("x", 0.0), ("rhythm", 1.0)])
            .unwrap();
        let second = cache
            .get_or_eval(0, &f, 0.0, &[("x", 0.0), ("rhythm", 5.0)])
            .unwrap();
        assert_eq!(first, 2.0);
        assert_eq!(second, 2.0);
    }

    #[test]
    fn scopes_are_separate() {
        let mut cache = FormulaCache::new(CachePolicy::Enabled);
        let f = Formula::parse("rhythm").unwrap();
        let a = cache.get_or_eval(0, &f, 0.0, &[("rhythm", 1.0)]).unwrap();
        let b = cache.get_or_eval(1, &f, 0.0, &[("rhythm", 2.0)]).unwrap();
        assert_eq!((a, b), (1.0, 2.0));
    }

    #[test]
    fn disabled_never_stores() {
        let mut cache = FormulaCache::new(CachePolicy::Disabled);
        let f = Formula::parse("x").unwrap();
        cache.get_or_eval(0, &f, 1.0, &[("x", 1.0)]).unwrap();
        cache.get_or_eval(0, &f, 1.0, &[("x", 1.0)]).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = FormulaCache::new(CachePolicy::Enabled);
        let f = Formula::parse("missing").unwrap();
        assert!(cache.get_or_eval(0, &f, 0.0, &[("x", 0.0)]).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_resets() {
        let mut cache = FormulaCache::default();
        let f = Formula::parse("1").unwrap();
        cache.get_or_eval(0, &f, 0.0, &[("x", 0.0)]).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }
}
