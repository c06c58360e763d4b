//! Per-occurrence minimized/expanded state.
//!
//! State lives outside the core computations. The presentation layer owns
//! a [`ViewStateStore`] and passes the state of each occurrence into
//! [`render_structure`](crate::render::render_structure).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::regions::StructureRef;

/// Whether a structure shows only its key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureViewState {
    pub is_minimized: bool,
}

impl Default for StructureViewState {
    fn default() -> Self {
        Self { is_minimized: true }
    }
}

impl StructureViewState {
    pub fn minimized() -> Self {
        Self { is_minimized: true }
    }

    pub fn expanded() -> Self {
        Self {
            is_minimized: false,
        }
    }

    /// Flip between minimized and expanded.
    pub fn toggle(&mut self) {
        self.is_minimized = !self.is_minimized;
    }
}

/// View state keyed by structure occurrence.
///
/// Occurrences never touched are minimized.
#[derive(Debug, Clone, Default)]
pub struct ViewStateStore {
    states: HashMap<StructureRef, StructureViewState>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every listed occurrence in `state`.
    pub fn with_all<'a, I>(refs: I, state: StructureViewState) -> Self
    where
        I: IntoIterator<Item = &'a StructureRef>,
    {
        Self {
            states: refs.into_iter().map(|r| (r.clone(), state)).collect(),
        }
    }

    pub fn get(&self, sref: &StructureRef) -> StructureViewState {
        self.states.get(sref).copied().unwrap_or_default()
    }

    pub fn is_minimized(&self, sref: &StructureRef) -> bool {
        self.get(sref).is_minimized
    }

    pub fn set(&mut self, sref: &StructureRef, state: StructureViewState) {
        self.states.insert(sref.clone(), state);
    }

    /// Toggle one occurrence and return its new state.
    pub fn toggle(&mut self, sref: &StructureRef) -> StructureViewState {
        let state = self.states.entry(sref.clone()).or_default();
        state.toggle();
        *state
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
