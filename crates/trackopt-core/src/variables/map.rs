//! Key-to-index maps and the per-session registry that allocates them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::Range;
use std::rc::Rc;

use trackopt_expr::{Expr, VarRef, VariableId};
use trackopt_solver::{BackendError, VariableType};

use crate::error::SolverError;
use crate::variables::VariableKind;

/// Solver indices of one variable kind, in allocation order.
///
/// Cloning is cheap: the keys are shared with the session's registry.
pub struct VariableMap<K: VariableKind> {
    keys: Rc<Vec<K::Key>>,
    lookup: Rc<HashMap<K::Key, VariableId>>,
    range: Range<usize>,
    _kind: PhantomData<K>,
}

impl<K: VariableKind> Clone for VariableMap<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Rc::clone(&self.keys),
            lookup: Rc::clone(&self.lookup),
            range: self.range.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: VariableKind> std::fmt::Debug for VariableMap<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableMap")
            .field("kind", &K::NAME)
            .field("range", &self.range)
            .finish()
    }
}

impl<K: VariableKind> VariableMap<K> {
    /// Solver index of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownKey`] when the kind has no variable for
    /// `key`.
    pub fn get(&self, key: &K::Key) -> Result<VariableId, SolverError> {
        self.lookup
            .get(key)
            .copied()
            .ok_or_else(|| SolverError::UnknownKey {
                kind: K::NAME,
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &K::Key) -> bool {
        self.lookup.contains_key(key)
    }

    /// `(key, index)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&K::Key, VariableId)> + '_ {
        self.keys
            .iter()
            .map(|key| (key, self.lookup[key]))
    }

    pub fn keys(&self) -> &[K::Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Dense index range occupied by this kind.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Bound expression handle for `key`, named like `NodeSelected[3]`.
    pub fn var(&self, key: &K::Key) -> Result<VarRef, SolverError> {
        let index = self.get(key)?;
        Ok(VarRef::new(format!("{}[{}]", K::NAME, key), index))
    }

    /// [`VariableMap::var`] wrapped in an [`Expr`].
    pub fn expr(&self, key: &K::Key) -> Result<Expr, SolverError> {
        Ok(Expr::variable(self.var(key)?))
    }
}

struct KindEntry {
    name: &'static str,
    range: Range<usize>,
    variable_type: VariableType,
}

/// Allocates contiguous index ranges per variable kind.
///
/// Indices grow monotonically and are never reused.
#[derive(Default)]
pub(crate) struct VariableRegistry {
    maps: HashMap<TypeId, Box<dyn Any>>,
    entries: Vec<KindEntry>,
    num_variables: usize,
}

impl VariableRegistry {
    pub(crate) fn get<K: VariableKind>(&self) -> Option<VariableMap<K>> {
        self.maps
            .get(&TypeId::of::<K>())
            .and_then(|map| map.downcast_ref::<VariableMap<K>>())
            .cloned()
    }

    pub(crate) fn allocate<K: VariableKind>(
        &mut self,
        keys: Vec<K::Key>,
    ) -> Result<VariableMap<K>, SolverError> {
        let offset = self.num_variables;
        let mut lookup = HashMap::with_capacity(keys.len());
        let mut unique = Vec::with_capacity(keys.len());
        for key in keys {
            if lookup.contains_key(&key) {
                continue;
            }
            let index = VariableId::from_index(offset + unique.len()).ok_or_else(|| {
                BackendError::InvalidProblem("variable count exceeds u32 range".to_string())
            })?;
            lookup.insert(key.clone(), index);
            unique.push(key);
        }

        let range = offset..offset + unique.len();
        let map = VariableMap::<K> {
            keys: Rc::new(unique),
            lookup: Rc::new(lookup),
            range: range.clone(),
            _kind: PhantomData,
        };
        self.num_variables = range.end;
        self.entries.push(KindEntry {
            name: K::NAME,
            range,
            variable_type: K::variable_type(),
        });
        self.maps.insert(TypeId::of::<K>(), Box::new(map.clone()));
        Ok(map)
    }

    pub(crate) fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Non-binary index ranges with their domain.
    pub(crate) fn typed_ranges(&self) -> impl Iterator<Item = (Range<usize>, VariableType)> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.variable_type != VariableType::Binary)
            .map(|entry| (entry.range.clone(), entry.variable_type))
    }

    /// `(kind name, variable count)` in instantiation order.
    pub(crate) fn kinds(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name, entry.range.len()))
    }
}
