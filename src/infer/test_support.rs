//! Test doubles for runner unit tests

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::{InferenceError, Result};
use crate::tensor::{Statistic, TensorHandle, TensorName, TensorValue};

use super::summary::ScalarSummaries;
use super::traits::{
    ExecutionContext, Inferencer, InputPipeline, Model, Placeholder, Predictor, SummarySink,
    TowerSpec, TrainerHandle,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    BeforePass,
    Datapoint(Vec<TensorValue>),
    AfterPass,
}

/// Shared view of everything a [`Recorder`] saw.
#[derive(Clone, Default)]
pub struct RecorderLog(Arc<Mutex<Vec<Event>>>);

impl RecorderLog {
    fn push(&self, e: Event) {
        self.0.lock().unwrap().push(e);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn datapoints(&self) -> Vec<Vec<TensorValue>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Datapoint(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Inferencer recording every call it receives.
pub struct Recorder {
    names: Vec<String>,
    stats: Vec<(String, Statistic)>,
    log: RecorderLog,
}

impl Recorder {
    pub fn new(names: &[&str]) -> (Self, RecorderLog) {
        let log = RecorderLog::default();
        let names = names.iter().map(|n| n.to_string()).collect();
        (Self { names, stats: vec![], log: log.clone() }, log)
    }

    pub fn with_stat(mut self, name: &str, stat: impl Into<Statistic>) -> Self {
        self.stats.push((name.to_string(), stat.into()));
        self
    }
}

impl Inferencer for Recorder {
    fn requested_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn before_pass(&mut self) {
        self.log.push(Event::BeforePass);
    }

    fn on_datapoint(&mut self, values: &[&TensorValue]) {
        self.log.push(Event::Datapoint(values.iter().map(|v| (*v).clone()).collect()));
    }

    fn after_pass(&mut self) -> BTreeMap<String, Statistic> {
        self.log.push(Event::AfterPass);
        self.stats.iter().cloned().collect()
    }

    fn name(&self) -> &'static str {
        "Recorder"
    }
}

pub fn scalar(x: f32) -> TensorValue {
    TensorValue::from_elem(ndarray::IxDyn(&[1]), x)
}

/// Model with fixed placeholders that remembers which inputs towers were built on.
#[derive(Default)]
pub struct MockModel {
    pub placeholders: Vec<Placeholder>,
    pub built_on: Mutex<Vec<Vec<TensorHandle>>>,
}

impl MockModel {
    pub fn new(placeholders: Vec<Placeholder>) -> Self {
        Self { placeholders, built_on: Mutex::default() }
    }
}

impl Model for MockModel {
    fn reused_placeholders(&self) -> Vec<Placeholder> {
        self.placeholders.clone()
    }

    fn build_graph(&self, _graph: &mut dyn ExecutionContext, inputs: &[TensorHandle]) -> Result<()> {
        self.built_on.lock().unwrap().push(inputs.to_vec());
        Ok(())
    }
}

/// Trainer whose predictor maps output slot `j` to `sum(feed) * (j + 1)`.
pub struct MockTrainer {
    pub model: MockModel,
    pub summaries: ScalarSummaries,
    pub predictor_requests: Vec<(Vec<TensorName>, Vec<TensorName>)>,
    pub fail_on_call: Option<usize>,
}

impl MockTrainer {
    pub fn new(placeholders: Vec<Placeholder>) -> Self {
        Self {
            model: MockModel::new(placeholders),
            summaries: ScalarSummaries::new(),
            predictor_requests: vec![],
            fail_on_call: None,
        }
    }
}

impl SummarySink for MockTrainer {
    fn add_scalar_summary(&mut self, name: &str, value: f64) {
        self.summaries.add_scalar_summary(name, value);
    }
}

impl TrainerHandle for MockTrainer {
    fn model(&self) -> &dyn Model {
        &self.model
    }

    fn get_predictor(
        &mut self,
        input_names: &[TensorName],
        output_names: &[TensorName],
    ) -> Result<Box<dyn Predictor>> {
        self.predictor_requests.push((input_names.to_vec(), output_names.to_vec()));
        let n_out = output_names.len();
        let fail_on_call = self.fail_on_call;
        let mut calls = 0usize;
        Ok(Box::new(move |feed: &[TensorValue]| -> Result<Vec<TensorValue>> {
            calls += 1;
            if fail_on_call == Some(calls) {
                return Err(InferenceError::Prediction(format!("call {calls} failed")));
            }
            let total: f32 = feed.iter().map(|v| v.sum()).sum();
            Ok((0..n_out).map(|j| scalar(total * (j + 1) as f32)).collect())
        }))
    }
}

/// Graph whose towers expose a fixed set of op names. Every `run` returns
/// `run_index + 10 * fetch_position` for each fetch.
#[derive(Default)]
pub struct MockGraph {
    pub tower_ops: Vec<String>,
    pub towers: HashSet<String>,
    pub tensors: HashSet<TensorName>,
    pub built_specs: Vec<TowerSpec>,
    pub runs: Vec<Vec<TensorHandle>>,
}

impl MockGraph {
    pub fn new(tower_ops: &[&str]) -> Self {
        Self { tower_ops: tower_ops.iter().map(|s| s.to_string()).collect(), ..Self::default() }
    }
}

impl ExecutionContext for MockGraph {
    fn has_tower(&self, name: &str) -> bool {
        self.towers.contains(name)
    }

    fn build_tower(
        &mut self,
        spec: &TowerSpec,
        build: &mut dyn FnMut(&mut dyn ExecutionContext) -> Result<()>,
    ) -> Result<()> {
        build(self)?;
        for op in &self.tower_ops {
            self.tensors.insert(TensorName::parse(op).scoped(&spec.name));
        }
        self.towers.insert(spec.name.clone());
        self.built_specs.push(spec.clone());
        Ok(())
    }

    fn tensor_by_name(&self, name: &TensorName) -> Result<TensorHandle> {
        if self.tensors.contains(name) {
            Ok(TensorHandle::new(name.clone()))
        } else {
            Err(InferenceError::UnknownTensor { name: name.to_string() })
        }
    }

    fn run(&mut self, fetches: &[TensorHandle]) -> Result<Vec<TensorValue>> {
        let step = self.runs.len() as f32;
        self.runs.push(fetches.to_vec());
        Ok((0..fetches.len()).map(|i| scalar(step + 10.0 * i as f32)).collect())
    }
}

/// Pipeline producing one reader tensor per model input.
pub struct MockPipeline {
    pub size: Option<usize>,
    pub n_tensors: Option<usize>,
    pub setups: Arc<Mutex<usize>>,
    tensors: Vec<TensorHandle>,
}

impl MockPipeline {
    pub fn sized(size: usize) -> Self {
        Self { size: Some(size), n_tensors: None, setups: Arc::default(), tensors: vec![] }
    }

    pub fn unsized_input() -> Self {
        Self { size: None, ..Self::sized(0) }
    }
}

impl InputPipeline for MockPipeline {
    fn setup(&mut self, model: &dyn Model, _graph: &mut dyn ExecutionContext) -> Result<()> {
        *self.setups.lock().unwrap() += 1;
        let n = self.n_tensors.unwrap_or_else(|| model.reused_placeholders().len());
        self.tensors = (0..n).map(|i| TensorHandle::new(format!("queue/dequeue:{i}"))).collect();
        Ok(())
    }

    fn input_tensors(&self) -> Vec<TensorHandle> {
        self.tensors.clone()
    }

    fn size(&self) -> Result<usize> {
        self.size.ok_or_else(|| InferenceError::UnsizedInput { reason: "endless queue".into() })
    }
}
