//! Scoped shadowing of the variable store.

use std::ops::{Deref, DerefMut};

use super::VariableStore;

/// An open shadow scope over a [`VariableStore`].
///
/// Creating the scope pushes a snapshot of every variable; dropping it pops
/// that snapshot, including when the scope is left through `?`, an early
/// return or a panic. The store is reachable through `Deref`/`DerefMut` while
/// the scope is open.
#[must_use = "the snapshot is restored as soon as the scope is dropped"]
pub struct ShadowScope<'a> {
    store: &'a mut VariableStore,
    level: u32,
}

impl<'a> ShadowScope<'a> {
    pub(crate) fn enter(store: &'a mut VariableStore) -> Self {
        let level = store.shadow_level() + 1;
        store.push_state(level);
        Self { store, level }
    }

    /// Nesting level this scope was opened at (1 for the outermost scope).
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Deref for ShadowScope<'_> {
    type Target = VariableStore;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl DerefMut for ShadowScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl Drop for ShadowScope<'_> {
    fn drop(&mut self) {
        self.store.pop_state(self.level);
    }
}

impl VariableStore {
    /// Open a shadow scope. Every change made through the returned guard is
    /// undone when it is dropped.
    pub fn shadow(&mut self) -> ShadowScope<'_> {
        ShadowScope::enter(self)
    }

    /// Run `operation` against a shadowed view of the store and return its
    /// result. No change made by `operation` survives the call.
    pub fn shadowed<R>(&mut self, operation: impl FnOnce(&mut VariableStore) -> R) -> R {
        let mut scope = self.shadow();
        operation(&mut *scope)
    }
}
