//! Registered weights of a session, in column order.

use std::fmt;

use crate::costs::weight::{Weight, WeightObserver};
use crate::error::SolverError;

/// `(cost name, field name)` a weight is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeightKey {
    pub cost: String,
    pub field: String,
}

impl WeightKey {
    pub fn new(cost: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            cost: cost.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for WeightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cost, self.field)
    }
}

/// Weights indexed by registration order; the index is the feature column.
#[derive(Default)]
pub struct Weights {
    entries: Vec<(WeightKey, Weight)>,
    observers: Vec<WeightObserver>,
}

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `weight` under `key` and return its column index.
    ///
    /// Observers of this collection are attached to the weight and told
    /// about it with `(None, value)`.
    pub fn add_weight(&mut self, weight: Weight, key: WeightKey) -> usize {
        let value = weight.value();
        for observer in &self.observers {
            weight.register_observer(observer.clone());
            observer(None, value);
        }
        self.entries.push((key, weight));
        self.entries.len() - 1
    }

    /// Column of `weight`, compared by identity.
    pub fn index_of(&self, weight: &Weight) -> Option<usize> {
        self.entries
            .iter()
            .position(|(_, registered)| registered.ptr_eq(weight))
    }

    /// Observe value changes of every current and future weight.
    pub fn register_observer(&mut self, observer: WeightObserver) {
        for (_, weight) in &self.entries {
            weight.register_observer(observer.clone());
        }
        self.observers.push(observer);
    }

    pub fn get(&self, cost: &str, field: &str) -> Option<f64> {
        self.find(cost, field).map(Weight::value)
    }

    /// Set the weight registered under `(cost, field)`.
    pub fn set(&self, cost: &str, field: &str, value: f64) -> Result<(), SolverError> {
        let weight = self.find(cost, field).ok_or_else(|| SolverError::UnknownKey {
            kind: "Weights",
            key: WeightKey::new(cost, field).to_string(),
        })?;
        weight.set_value(value);
        Ok(())
    }

    fn find(&self, cost: &str, field: &str) -> Option<&Weight> {
        self.entries
            .iter()
            .find(|(key, _)| key.cost == cost && key.field == field)
            .map(|(_, weight)| weight)
    }

    /// Values in column order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, weight)| weight.value()).collect()
    }

    /// Overwrite all values from `values`, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::WeightCountMismatch`] when the lengths differ.
    pub fn from_slice(&self, values: &[f64]) -> Result<(), SolverError> {
        if values.len() != self.entries.len() {
            return Err(SolverError::WeightCountMismatch {
                expected: self.entries.len(),
                actual: values.len(),
            });
        }
        for ((_, weight), value) in self.entries.iter().zip(values) {
            weight.set_value(*value);
        }
        Ok(())
    }

    /// Drop every weight registered after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&WeightKey, f64)> {
        self.entries.iter().map(|(key, weight)| (key, weight.value()))
    }
}

impl fmt::Debug for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, (key, value)) in self.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn two_weights() -> (Weights, Weight, Weight) {
        let mut weights = Weights::new();
        let a = Weight::new(1.0);
        let b = Weight::new(-2.5);
        weights.add_weight(a.clone(), WeightKey::new("EdgeSelection", "weight"));
        weights.add_weight(b.clone(), WeightKey::new("EdgeSelection", "constant"));
        (weights, a, b)
    }

    #[test]
    fn test_index_of_uses_identity() {
        let (weights, a, b) = two_weights();
        assert_eq!(weights.index_of(&a), Some(0));
        assert_eq!(weights.index_of(&b), Some(1));
        assert_eq!(weights.index_of(&Weight::new(1.0)), None);
    }

    #[test]
    fn test_vector_export_and_import() {
        let (weights, a, _) = two_weights();
        let exported = weights.to_vec();
        assert_eq!(exported, vec![1.0, -2.5]);

        weights.from_slice(&[4.0, 5.0]).unwrap();
        assert_eq!(a.value(), 4.0);
        weights.from_slice(&exported).unwrap();
        assert_eq!(weights.to_vec(), exported);

        let err = weights.from_slice(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            SolverError::WeightCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_observers_cover_existing_and_new_weights() {
        let (mut weights, a, _) = two_weights();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        weights.register_observer(Rc::new(move |_, _| counter.set(counter.get() + 1)));

        a.set_value(3.0);
        assert_eq!(calls.get(), 1);

        let c = Weight::new(0.0);
        weights.add_weight(c.clone(), WeightKey::new("Appear", "weight"));
        assert_eq!(calls.get(), 2);
        c.set_value(1.0);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_get_set_and_display() {
        let (weights, _, b) = two_weights();
        weights.set("EdgeSelection", "constant", 7.0).unwrap();
        assert_eq!(b.value(), 7.0);
        assert_eq!(weights.get("EdgeSelection", "constant"), Some(7.0));
        assert!(weights.set("Split", "weight", 1.0).is_err());
        assert_eq!(
            weights.to_string(),
            "(EdgeSelection, weight) = 1\n(EdgeSelection, constant) = 7"
        );
    }
}
