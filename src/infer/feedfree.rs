//! Inference runner over an input pipeline wired into the graph
//!
//! No values are fed per step: the pipeline's reader tensors drive a dedicated
//! evaluation tower that shares the trained parameters, and each step simply
//! evaluates the fetch list once.

use std::time::Instant;

use tracing::info;

use crate::config::FeedfreeRunnerConfig;
use crate::error::{InferenceError, Result};
use crate::tensor::{TensorHandle, TensorName};

use super::classify::{IoTensorRef, TensorClassification};
use super::dispatcher::DispatchPlan;
use super::pass::{dispatch_datapoint, PassReport, RunnerPhase};
use super::progress::PassProgress;
use super::summary::write_summaries;
use super::traits::{ExecutionContext, Inferencer, InputPipeline, TowerSpec, TrainerHandle};


const PREDICT_TOWER: &str = "towerp";

/// Name of the `tower_id`-th prediction tower under `prefix`.
pub fn predict_tower_name(prefix: &str, tower_id: usize) -> String {
    format!("{prefix}{PREDICT_TOWER}{tower_id}")
}

/// Fetch plan bound to one tower.
struct FeedfreePlan {
    tower_name: String,
    fetches: Vec<TensorHandle>,
    routes: Vec<Vec<IoTensorRef>>,
}

/// Runs a list of inferencers over a sized [`InputPipeline`].
///
/// Every runner builds its own tower named after its prefix; runners sharing
/// a graph must use distinct prefixes.
pub struct FeedfreeInferenceRunner {
    input: Box<dyn InputPipeline>,
    inferencers: Vec<Box<dyn Inferencer>>,
    size: usize,
    config: FeedfreeRunnerConfig,
    phase: RunnerPhase,
    plan: Option<FeedfreePlan>,
    built_tower: Option<String>,
}

impl FeedfreeInferenceRunner {
    /// Runner with an empty tower prefix
    pub fn new(input: Box<dyn InputPipeline>, inferencers: Vec<Box<dyn Inferencer>>) -> Result<Self> {
        Self::from_config(input, inferencers, FeedfreeRunnerConfig::default())
    }

    /// Runner with explicit configuration.
    ///
    /// Fails if the pipeline cannot report its size or if input-name
    /// remapping is requested.
    pub fn from_config(
        input: Box<dyn InputPipeline>,
        inferencers: Vec<Box<dyn Inferencer>>,
        config: FeedfreeRunnerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.input_names.is_some() {
            return Err(InferenceError::Unsupported {
                feature: "input_names remapping in FeedfreeInferenceRunner".into(),
            });
        }
        let size = input.size().map_err(|e| match e {
            e @ InferenceError::UnsizedInput { .. } => e,
            other => InferenceError::UnsizedInput { reason: other.to_string() },
        })?;

        Ok(Self {
            input,
            inferencers,
            size,
            config,
            phase: RunnerPhase::Idle,
            plan: None,
            built_tower: None,
        })
    }

    /// Same runner building its tower under `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        self.config.prefix = prefix.into();
        self.config.validate()?;
        Ok(self)
    }

    pub fn config(&self) -> &FeedfreeRunnerConfig {
        &self.config
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    /// Steps per pass, as reported by the pipeline
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn inferencers(&self) -> &[Box<dyn Inferencer>] {
        &self.inferencers
    }

    /// Name of the evaluation tower, once set up
    pub fn tower_name(&self) -> Option<&str> {
        self.plan.as_ref().map(|p| p.tower_name.as_str())
    }

    /// Fully-qualified tensors evaluated each step, once set up
    pub fn fetches(&self) -> Option<&[TensorHandle]> {
        self.plan.as_ref().map(|p| p.fetches.as_slice())
    }

    /// Bind the pipeline, build the evaluation tower and resolve every
    /// requested name inside it.
    ///
    /// Calling it again reuses the tower this runner already built and only
    /// re-resolves the fetch list.
    pub fn setup(&mut self, trainer: &dyn TrainerHandle, graph: &mut dyn ExecutionContext) -> Result<()> {
        let model = trainer.model();
        if self.built_tower.is_none() {
            self.input.setup(model, graph)?;
        }
        let input_tensors = self.input.input_tensors();
        let placeholders = model.reused_placeholders();
        if input_tensors.len() != placeholders.len() {
            return Err(InferenceError::InputCountMismatch {
                expected: placeholders.len(),
                actual: input_tensors.len(),
            });
        }

        let plan = DispatchPlan::from_entries(self.inferencers.iter().map(|i| i.requested_names()));
        let input_names: Vec<TensorName> = placeholders.iter().map(|p| p.feed_name()).collect();
        let classification = TensorClassification::new(plan.get_all_names(), &input_names);
        if let Some(name) = classification.first_input_resident(plan.get_all_names()) {
            return Err(InferenceError::InputTensorRequested { name: name.to_string() });
        }

        let tower_name = predict_tower_name(&self.config.prefix, 0);
        if self.built_tower.as_deref() != Some(tower_name.as_str()) {
            if graph.has_tower(&tower_name) {
                return Err(InferenceError::DuplicateTower { name: tower_name });
            }
            graph.build_tower(&TowerSpec::predict(&tower_name), &mut |g: &mut dyn ExecutionContext| {
                model.build_graph(g, &input_tensors)
            })?;
            self.built_tower = Some(tower_name.clone());
        }

        let fetches = plan
            .get_all_names()
            .iter()
            .map(|n| graph.tensor_by_name(&n.scoped(&tower_name)))
            .collect::<Result<Vec<_>>>()?;
        let routes = plan
            .get_idx_for_each_entry()
            .iter()
            .map(|entry| entry.iter().map(|&k| IoTensorRef::Output(k)).collect())
            .collect();

        info!(
            tower = %tower_name,
            fetches = fetches.len(),
            steps = self.size,
            inferencers = self.inferencers.len(),
            "FeedfreeInferenceRunner attached"
        );

        self.plan = Some(FeedfreePlan { tower_name, fetches, routes });
        self.phase = RunnerPhase::Setup;
        Ok(())
    }

    /// Evaluate the fetch list `size()` times and write summaries to `trainer`.
    ///
    /// Sets up lazily on first use. Restarting the pipeline between passes is
    /// the pipeline's own business.
    pub fn trigger(
        &mut self,
        trainer: &mut dyn TrainerHandle,
        graph: &mut dyn ExecutionContext,
    ) -> Result<PassReport> {
        if self.plan.is_none() {
            self.setup(trainer, graph)?;
        }

        let start = Instant::now();
        self.phase = RunnerPhase::Running;
        let datapoints = match self.run_pass(graph) {
            Ok(n) => n,
            Err(e) => {
                self.phase = RunnerPhase::Setup;
                return Err(e);
            }
        };

        let summary = write_summaries(trainer, &mut self.inferencers);
        self.phase = RunnerPhase::Done;

        let report = PassReport { datapoints, summary, elapsed_secs: start.elapsed().as_secs_f64() };
        info!(
            datapoints = report.datapoints,
            emitted = report.summary.emitted,
            skipped = report.summary.skipped.len(),
            elapsed_secs = report.elapsed_secs,
            "FeedfreeInferenceRunner pass finished"
        );
        Ok(report)
    }

    fn run_pass(&mut self, graph: &mut dyn ExecutionContext) -> Result<usize> {
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| InferenceError::config("FeedfreeInferenceRunner is not set up"))?;

        for inf in &mut self.inferencers {
            inf.before_pass();
        }

        let mut progress = PassProgress::new("FeedfreeInferenceRunner", Some(self.size), &self.config.progress);
        for _ in 0..self.size {
            let outputs = graph.run(&plan.fetches)?;
            if outputs.len() != plan.fetches.len() {
                return Err(InferenceError::OutputArity {
                    expected: plan.fetches.len(),
                    actual: outputs.len(),
                });
            }
            dispatch_datapoint(&mut self.inferencers, &plan.routes, &outputs, &[])?;
            progress.step();
        }
        Ok(progress.current())
    }
}
