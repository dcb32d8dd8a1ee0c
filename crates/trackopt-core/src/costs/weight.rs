//! Observable scalar weights.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Callback invoked with `(old, new)` when a weight changes. `old` is
/// `None` for the notification sent on registration.
pub type WeightObserver = Rc<dyn Fn(Option<f64>, f64)>;

struct WeightCell {
    value: Cell<f64>,
    observers: RefCell<Vec<WeightObserver>>,
}

/// A shared, mutable scalar multiplied with features to form costs.
///
/// Clones share the same value: a cost keeps one handle, the session's
/// [`crate::costs::Weights`] keeps another.
#[derive(Clone)]
pub struct Weight(Rc<WeightCell>);

impl Weight {
    pub fn new(value: f64) -> Self {
        Self(Rc::new(WeightCell {
            value: Cell::new(value),
            observers: RefCell::new(Vec::new()),
        }))
    }

    pub fn value(&self) -> f64 {
        self.0.value.get()
    }

    /// Set the value and notify every observer, even if it is unchanged.
    pub fn set_value(&self, value: f64) {
        let old = self.0.value.replace(value);
        let observers = self.0.observers.borrow().clone();
        for observer in observers {
            observer(Some(old), value);
        }
    }

    pub fn register_observer(&self, observer: WeightObserver) {
        self.0.observers.borrow_mut().push(observer);
    }

    /// Whether both handles refer to the same weight.
    pub fn ptr_eq(&self, other: &Weight) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<f64> for Weight {
    fn from(value: f64) -> Self {
        Weight::new(value)
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weight")
            .field("value", &self.value())
            .field("observers", &self.0.observers.borrow().len())
            .finish()
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
