//! OutputVector - shared channel values
//!
//! One writer (the firing supervisor) and one reader per dispatcher channel.
//! The lock is held for a single read or write; a whole-vector write is one
//! critical section, so readers never see half of an update.

use std::sync::{Arc, PoisonError, RwLock};

/// Channel index -> output value
#[derive(Debug, Clone)]
pub struct OutputVector {
    values: Arc<RwLock<Box<[f64]>>>,
}

impl OutputVector {
    /// Create a zeroed vector of `len` channels
    pub fn new(len: usize) -> Self {
        Self {
            values: Arc::new(RwLock::new(vec![0.0; len].into_boxed_slice())),
        }
    }

    pub fn len(&self) -> usize {
        self.read(|values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of one channel
    pub fn get(&self, index: usize) -> Option<f64> {
        self.read(|values| values.get(index).copied())
    }

    /// Set one channel; returns false when `index` is out of range
    pub fn set(&self, index: usize, value: f64) -> bool {
        self.write(|values| match values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        })
    }

    /// Overwrite the leading channels with `values` in one critical section
    ///
    /// Extra input values are ignored; channels past `values.len()` keep
    /// their previous value.
    pub fn write_all(&self, values: &[f64]) {
        self.write(|slots| {
            for (slot, value) in slots.iter_mut().zip(values) {
                *slot = *value;
            }
        });
    }

    /// Set every channel to zero
    pub fn zero(&self) {
        self.write(|slots| slots.fill(0.0));
    }

    /// Copy of all channels
    pub fn snapshot(&self) -> Vec<f64> {
        self.read(|values| values.to_vec())
    }

    fn read<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R {
        let guard = self.values.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        let mut guard = self.values.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
