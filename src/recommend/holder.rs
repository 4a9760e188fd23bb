//! Shared, swappable model state.
//!
//! A [`ModelHolder`] owns the pointer readers consult. Writers build a new
//! value without holding any lock and then swap it in under one short write
//! lock, so readers never wait on a training run and never observe a
//! half-built value.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// Holds the current value behind an atomically swapped `Arc`.
#[derive(Debug)]
pub struct ModelHolder<T> {
    current: RwLock<Option<Arc<T>>>,
}

impl<T> ModelHolder<T> {
    /// Create an empty holder.
    pub fn new() -> Self {
        ModelHolder {
            current: RwLock::new(None),
        }
    }

    /// Snapshot of the current value. The snapshot stays valid even if the
    /// value is replaced while the caller uses it.
    pub fn current(&self) -> Option<Arc<T>> {
        self.current.read().clone()
    }

    /// Swap in a new value, returning the previous one.
    pub fn replace(&self, value: T) -> Option<Arc<T>> {
        let value = Arc::new(value);
        self.current.write().replace(value)
    }

    /// Build a new value off-lock and swap it in on success. On failure the
    /// current value is left untouched.
    pub fn rebuild<F>(&self, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let value = Arc::new(build()?);
        *self.current.write() = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

impl<T> Default for ModelHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}
