//! In-memory dataset

use crate::tensor::Datapoint;

use super::traits::Dataset;

/// Dataset over a fixed list of datapoints.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDataset {
    datapoints: Vec<Datapoint>,
    resets: usize,
}

impl InMemoryDataset {
    pub fn new(datapoints: Vec<Datapoint>) -> Self {
        Self { datapoints, resets: 0 }
    }

    /// How many times `reset_state` was called
    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }
}

impl Dataset for InMemoryDataset {
    fn reset_state(&mut self) {
        self.resets += 1;
    }

    fn size(&self) -> Option<usize> {
        Some(self.datapoints.len())
    }

    fn get_data(&mut self) -> Box<dyn Iterator<Item = Datapoint> + '_> {
        Box::new(self.datapoints.iter().cloned())
    }
}
