//! Deduplicating registry of requested tensor names
//!
//! Each inferencer contributes one entry: the ordered list of names it wants
//! per datapoint. Names are deduplicated across entries so every tensor is
//! fetched once per step, and each entry remembers which global slots to read.

use std::collections::HashMap;

use crate::tensor::TensorName;

/// Builder collecting one entry per inferencer.
///
/// Call [`finish`](Self::finish) once all entries are registered; the
/// resulting [`DispatchPlan`] cannot grow any further.
#[derive(Clone, Debug, Default)]
pub struct OutputTensorDispatcher {
    names: Vec<TensorName>,
    positions: HashMap<TensorName, usize>,
    idxs: Vec<Vec<usize>>,
}

impl OutputTensorDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entry. Names are canonicalized before deduplication, so
    /// `acc` and `acc:0` share a slot.
    pub fn add_entry<S: AsRef<str>>(&mut self, names: &[S]) {
        let entry = names
            .iter()
            .map(|n| {
                let name = TensorName::parse(n.as_ref());
                match self.positions.get(&name) {
                    Some(&idx) => idx,
                    None => {
                        let idx = self.names.len();
                        self.positions.insert(name.clone(), idx);
                        self.names.push(name);
                        idx
                    }
                }
            })
            .collect();
        self.idxs.push(entry);
    }

    /// Unique names in first-seen order
    pub fn get_all_names(&self) -> &[TensorName] {
        &self.names
    }

    /// Global indices per entry, in registration order, repeats kept
    pub fn get_idx_for_each_entry(&self) -> &[Vec<usize>] {
        &self.idxs
    }

    /// Same as [`get_idx_for_each_entry`](Self::get_idx_for_each_entry), resolved to names
    pub fn get_names_for_each_entry(&self) -> Vec<Vec<TensorName>> {
        resolve_entries(&self.names, &self.idxs)
    }

    /// Freeze the registry.
    pub fn finish(self) -> DispatchPlan {
        DispatchPlan { names: self.names, idxs: self.idxs }
    }
}

/// Immutable fetch plan produced by [`OutputTensorDispatcher::finish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchPlan {
    names: Vec<TensorName>,
    idxs: Vec<Vec<usize>>,
}

impl DispatchPlan {
    /// Build a plan from every inferencer's request list, in order.
    pub fn from_entries<I, E, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut dispatcher = OutputTensorDispatcher::new();
        for entry in entries {
            dispatcher.add_entry(entry.as_ref());
        }
        dispatcher.finish()
    }

    /// Unique names in first-seen order
    pub fn get_all_names(&self) -> &[TensorName] {
        &self.names
    }

    /// Global indices per entry
    pub fn get_idx_for_each_entry(&self) -> &[Vec<usize>] {
        &self.idxs
    }

    /// Names per entry
    pub fn get_names_for_each_entry(&self) -> Vec<Vec<TensorName>> {
        resolve_entries(&self.names, &self.idxs)
    }

    /// Number of entries registered
    pub fn num_entries(&self) -> usize {
        self.idxs.len()
    }
}

fn resolve_entries(names: &[TensorName], idxs: &[Vec<usize>]) -> Vec<Vec<TensorName>> {
    idxs.iter().map(|entry| entry.iter().map(|&k| names[k].clone()).collect()).collect()
}
