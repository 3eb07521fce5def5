//! Feature vectors and per-bin scratch storage.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which accumulation phase a feature vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorRole {
    Spatial,
    Temporal,
    Output,
}

/// Ordered feature names of one vector role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub role: VectorRole,
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(role: VectorRole, names: Vec<String>) -> Self {
        Self { role, names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Fixed-length numeric vector. Slots start as NaN ("no data").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![f64::NAN; len],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Value of a named slot.
    pub fn get_named(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.index_of(name).map(|i| self.values[i])
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Keyed scratch storage scoped to one bin during one accumulation phase.
///
/// Aggregators stay stateless; anything that has to survive between the
/// calls of a phase (for example the values a percentile is computed from)
/// is put here by name. The orchestrator owns one context per bin and phase
/// and drops it when the phase completes.
pub struct BinContext {
    index: u64,
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl BinContext {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            entries: HashMap::new(),
        }
    }

    /// Index of the bin this context belongs to.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Typed value stored under `name`, `None` if absent or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name).and_then(|v| v.downcast_mut())
    }

    /// Store a value, replacing any previous one.
    pub fn put<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Box::new(value));
    }

    /// Remove and return a typed value.
    pub fn take<T: Any>(&mut self, name: &str) -> Option<T> {
        let boxed = self.entries.remove(name)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                // Wrong type: keep the entry.
                self.entries.insert(name.to_string(), other);
                None
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for BinContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("BinContext")
            .field("index", &self.index)
            .field("keys", &keys)
            .finish()
    }
}
