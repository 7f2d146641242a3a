//! Interfaces of the collaborators an inference pass talks to
//!
//! - `Inferencer` - statistic accumulator fed one datapoint at a time
//! - `Dataset` - restartable source of datapoints for fed passes
//! - `Predictor` - maps one feed vector to one output vector
//! - `Model`, `ExecutionContext`, `InputPipeline` - graph side of feedfree passes
//! - `SummarySink`, `TrainerHandle` - the owning trainer

use std::collections::BTreeMap;

use crate::error::Result;
use crate::tensor::{Datapoint, Statistic, TensorHandle, TensorName, TensorValue};

/// Pluggable statistic accumulator.
///
/// The runner never computes statistics itself; it only routes the requested
/// tensors to `on_datapoint` and forwards whatever `after_pass` reports.
pub trait Inferencer {
    /// Tensor names needed per datapoint, in the order `on_datapoint` expects them
    fn requested_names(&self) -> Vec<String>;

    /// Called once before every pass
    fn before_pass(&mut self) {}

    /// Called once per datapoint with one value per requested name
    fn on_datapoint(&mut self, values: &[&TensorValue]);

    /// Called once after every pass; scalar-convertible entries become summaries
    fn after_pass(&mut self) -> BTreeMap<String, Statistic> {
        BTreeMap::new()
    }

    /// Name used in log messages
    fn name(&self) -> &'static str {
        "Inferencer"
    }
}

/// Restartable source of fixed-shape datapoints.
pub trait Dataset {
    /// Rewind to the first datapoint
    fn reset_state(&mut self);

    /// Number of datapoints per pass, if known. Used for progress only.
    fn size(&self) -> Option<usize>;

    /// Datapoints in order, each one value per input name
    fn get_data(&mut self) -> Box<dyn Iterator<Item = Datapoint> + '_>;
}

/// Callable evaluating the graph on one explicitly fed datapoint.
pub trait Predictor {
    fn predict(&mut self, feed: &[TensorValue]) -> Result<Vec<TensorValue>>;
}

impl<F> Predictor for F
where
    F: FnMut(&[TensorValue]) -> Result<Vec<TensorValue>>,
{
    fn predict(&mut self, feed: &[TensorValue]) -> Result<Vec<TensorValue>> {
        self(feed)
    }
}

/// Layout of a declared model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Dense,
    /// Made of several component tensors under one scope
    Sparse,
}

/// Input tensor declared by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placeholder {
    name: TensorName,
    kind: PlaceholderKind,
}

impl Placeholder {
    pub fn dense(name: impl Into<TensorName>) -> Self {
        Self { name: name.into(), kind: PlaceholderKind::Dense }
    }

    pub fn sparse(name: impl Into<TensorName>) -> Self {
        Self { name: name.into(), kind: PlaceholderKind::Sparse }
    }

    pub fn name(&self) -> &TensorName {
        &self.name
    }

    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    /// Canonical name this input is fed and looked up under.
    ///
    /// Sparse inputs are keyed by their scope, so `label/indices:0` is fed and
    /// requested as `label:0`.
    pub fn feed_name(&self) -> TensorName {
        match self.kind {
            PlaceholderKind::Dense => self.name.clone(),
            PlaceholderKind::Sparse => TensorName::parse(self.name.group_key()),
        }
    }
}

/// Model whose graph can be instantiated once per tower.
pub trait Model {
    /// Declared inputs, in datapoint order
    fn reused_placeholders(&self) -> Vec<Placeholder>;

    /// Build the model's graph on top of `inputs` inside the current tower
    fn build_graph(&self, graph: &mut dyn ExecutionContext, inputs: &[TensorHandle]) -> Result<()>;
}

/// Parameters of a tower built for evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerSpec {
    /// Name prefix of every tensor created inside the tower
    pub name: String,
    /// Share existing trained variables instead of creating new ones
    pub reuse_variables: bool,
    /// Build training-only ops such as dropout
    pub is_training: bool,
}

impl TowerSpec {
    /// Inference-only tower reusing trained parameters.
    pub fn predict(name: impl Into<String>) -> Self {
        Self { name: name.into(), reuse_variables: true, is_training: false }
    }
}

/// Explicit handle to the graph and the session that runs it.
pub trait ExecutionContext {
    /// Whether a tower with this name was already built
    fn has_tower(&self, name: &str) -> bool;

    /// Open a tower scope, run `build` inside it, close the scope.
    fn build_tower(
        &mut self,
        spec: &TowerSpec,
        build: &mut dyn FnMut(&mut dyn ExecutionContext) -> Result<()>,
    ) -> Result<()>;

    /// Look up a tensor by its fully-qualified name
    fn tensor_by_name(&self, name: &TensorName) -> Result<TensorHandle>;

    /// Evaluate `fetches` once; inputs come from pipelines wired into the graph
    fn run(&mut self, fetches: &[TensorHandle]) -> Result<Vec<TensorValue>>;
}

/// Input pipeline wired directly into the graph.
pub trait InputPipeline {
    /// Allocate reading tensors for `model`
    fn setup(&mut self, model: &dyn Model, graph: &mut dyn ExecutionContext) -> Result<()>;

    /// Tensors the pipeline produces, one per model input
    fn input_tensors(&self) -> Vec<TensorHandle>;

    /// Elements per pass. Fails with `UnsizedInput` when the count is unknowable.
    fn size(&self) -> Result<usize>;
}

/// Destination of scalar summaries.
pub trait SummarySink {
    fn add_scalar_summary(&mut self, name: &str, value: f64);
}

/// The trainer owning the runners.
pub trait TrainerHandle: SummarySink {
    fn model(&self) -> &dyn Model;

    /// Predictor feeding `input_names` and fetching `output_names`, in order
    fn get_predictor(
        &mut self,
        input_names: &[TensorName],
        output_names: &[TensorName],
    ) -> Result<Box<dyn Predictor>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;

    #[test]
    fn test_dense_feed_name_is_canonical() {
        let p = Placeholder::dense("image");
        assert_eq!(p.feed_name().to_string(), "image:0");
        assert_eq!(p.kind(), PlaceholderKind::Dense);
    }

    #[test]
    fn test_sparse_feed_name_is_group_key() {
        let p = Placeholder::sparse("label/indices:0");
        assert_eq!(p.feed_name(), TensorName::parse("label"));
        assert_eq!(p.name().to_string(), "label/indices:0");
    }

    #[test]
    fn test_closure_is_a_predictor() {
        let mut calls = 0;
        let mut predictor = |feed: &[TensorValue]| -> Result<Vec<TensorValue>> {
            calls += 1;
            Ok(feed.iter().map(|v| v * 2.0).collect())
        };
        let feed = vec![TensorValue::from_elem(ndarray::IxDyn(&[2]), 1.5)];
        let out = predictor.predict(&feed).unwrap();
        assert_eq!(out[0], TensorValue::from_elem(ndarray::IxDyn(&[2]), 3.0));
        drop(predictor);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_closure_predictor_propagates_errors() {
        let mut predictor =
            |_: &[TensorValue]| -> Result<Vec<TensorValue>> { Err(InferenceError::Prediction("oom".into())) };
        assert!(matches!(predictor.predict(&[]), Err(InferenceError::Prediction(_))));
    }

    #[test]
    fn test_predict_tower_spec() {
        let spec = TowerSpec::predict("valtowerp0");
        assert!(spec.reuse_variables);
        assert!(!spec.is_training);
    }

    #[test]
    fn test_default_inferencer_hooks() {
        struct Noop;
        impl Inferencer for Noop {
            fn requested_names(&self) -> Vec<String> {
                vec![]
            }
            fn on_datapoint(&mut self, _: &[&TensorValue]) {}
        }

        let mut inf = Noop;
        inf.before_pass();
        assert!(inf.after_pass().is_empty());
        assert_eq!(inf.name(), "Inferencer");
    }
}
