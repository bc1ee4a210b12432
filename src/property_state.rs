use std::collections::HashSet;

use crate::{FieldReference, InstanceId};

#[cfg(test)]
mod tests;

/// The set of fields whose live value differs from the baseline.
///
/// Presence of a reference means "changed". A reference is stored at most once.
#[derive(Debug, Default, Clone)]
pub struct PropertyStates {
    states: HashSet<FieldReference>,
}

impl PropertyStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `field` as changed. Adding an already changed field is a no-op.
    pub fn add(&mut self, field: FieldReference) {
        self.states.insert(field);
    }

    pub fn clear_state(&mut self, field: &FieldReference) {
        self.states.remove(field);
    }

    /// Clears every state belonging to `instance_id`.
    pub fn clear_instance(&mut self, instance_id: InstanceId) {
        self.states.retain(|s| !s.is_on(instance_id));
    }

    pub fn clear_all(&mut self) {
        self.states.clear();
    }

    /// Re-evaluates `field` against the current comparison.
    ///
    /// A field changed away from its baseline and later changed back must end up unmarked,
    /// so the state is always cleared before it is conditionally added.
    pub fn update(&mut self, field: FieldReference, is_changed: bool) {
        self.clear_state(&field);
        if is_changed {
            self.add(field);
        }
    }

    pub fn get_state(&self, field: &FieldReference) -> bool {
        self.states.contains(field)
    }

    /// Returns true if any field is marked, optionally restricted to one instance.
    pub fn has_states(&self, instance_id: Option<InstanceId>) -> bool {
        match instance_id {
            Some(id) => self.states.iter().any(|s| s.is_on(id)),
            None => !self.states.is_empty(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldReference> {
        self.states.iter()
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
