//! Inference runner feeding datapoints explicitly
//!
//! Each datapoint from a [`Dataset`] is fed to a predictor obtained from the
//! trainer; the predictor's outputs and the datapoint itself are then routed to
//! every inferencer in the order it requested them.

use std::time::Instant;

use tracing::info;

use crate::config::InferenceRunnerConfig;
use crate::error::{InferenceError, Result};
use crate::tensor::TensorName;

use super::classify::{IoTensorRef, TensorClassification};
use super::dispatcher::DispatchPlan;
use super::pass::{dispatch_datapoint, PassReport, RunnerPhase};
use super::progress::PassProgress;
use super::summary::write_summaries;
use super::traits::{Dataset, Inferencer, Predictor, TrainerHandle};


/// Fetch plan bound to one trainer attachment.
struct FedPlan {
    input_names: Vec<TensorName>,
    output_names: Vec<TensorName>,
    routes: Vec<Vec<IoTensorRef>>,
    predictor: Box<dyn Predictor>,
}

/// Runs a list of inferencers over a [`Dataset`], feeding each datapoint.
///
/// # Example
///
/// ```no_run
/// use inferir::infer::{InMemoryDataset, InferenceRunner, Inferencer};
///
/// # fn run(trainer: &mut dyn inferir::infer::TrainerHandle, acc: Box<dyn Inferencer>) -> inferir::Result<()> {
/// let mut runner = InferenceRunner::new(Box::new(InMemoryDataset::new(vec![])), vec![acc]);
/// let report = runner.trigger(trainer)?;
/// println!("routed {} datapoints", report.datapoints);
/// # Ok(())
/// # }
/// ```
pub struct InferenceRunner {
    dataset: Box<dyn Dataset>,
    inferencers: Vec<Box<dyn Inferencer>>,
    config: InferenceRunnerConfig,
    phase: RunnerPhase,
    plan: Option<FedPlan>,
}

impl InferenceRunner {
    /// Runner feeding datapoints to the model's declared inputs
    pub fn new(dataset: Box<dyn Dataset>, inferencers: Vec<Box<dyn Inferencer>>) -> Self {
        Self {
            dataset,
            inferencers,
            config: InferenceRunnerConfig::default(),
            phase: RunnerPhase::Idle,
            plan: None,
        }
    }

    /// Runner with explicit configuration
    pub fn from_config(
        dataset: Box<dyn Dataset>,
        inferencers: Vec<Box<dyn Inferencer>>,
        config: InferenceRunnerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::new(dataset, inferencers) })
    }

    /// Feed datapoint components to these tensors instead of the model's
    /// declared inputs.
    pub fn with_input_names<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        self.config.input_names = Some(names.iter().map(|n| n.as_ref().to_string()).collect());
        self.config.validate()?;
        Ok(self)
    }

    pub fn config(&self) -> &InferenceRunnerConfig {
        &self.config
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    pub fn inferencers(&self) -> &[Box<dyn Inferencer>] {
        &self.inferencers
    }

    /// Names fed per datapoint, once set up
    pub fn input_names(&self) -> Option<&[TensorName]> {
        self.plan.as_ref().map(|p| p.input_names.as_slice())
    }

    /// Names fetched from the predictor, once set up
    pub fn output_names(&self) -> Option<&[TensorName]> {
        self.plan.as_ref().map(|p| p.output_names.as_slice())
    }

    /// Per-inferencer value references, once set up
    pub fn routes(&self) -> Option<&[Vec<IoTensorRef>]> {
        self.plan.as_ref().map(|p| p.routes.as_slice())
    }

    /// Attach to `trainer`: resolve input names, classify every requested
    /// name and acquire a predictor. Re-attaching rebuilds the plan.
    pub fn setup(&mut self, trainer: &mut dyn TrainerHandle) -> Result<()> {
        let input_names: Vec<TensorName> = match &self.config.input_names {
            Some(names) => names.iter().map(|n| TensorName::parse(n)).collect(),
            None => trainer.model().reused_placeholders().iter().map(|p| p.feed_name()).collect(),
        };

        let plan = DispatchPlan::from_entries(self.inferencers.iter().map(|i| i.requested_names()));
        let classification = TensorClassification::new(plan.get_all_names(), &input_names);
        let routes = classification.route(&plan)?;
        let output_names = classification.output_names().to_vec();
        let predictor = trainer.get_predictor(&input_names, &output_names)?;

        info!(
            inputs = input_names.len(),
            outputs = output_names.len(),
            inferencers = self.inferencers.len(),
            "InferenceRunner attached"
        );

        self.plan = Some(FedPlan { input_names, output_names, routes, predictor });
        self.phase = RunnerPhase::Setup;
        Ok(())
    }

    /// Run one full pass over the dataset and write summaries to `trainer`.
    ///
    /// Sets up lazily on first use. Any failing datapoint aborts the pass;
    /// the runner stays attached and the next trigger starts from scratch.
    pub fn trigger(&mut self, trainer: &mut dyn TrainerHandle) -> Result<PassReport> {
        if self.plan.is_none() {
            self.setup(trainer)?;
        }

        let start = Instant::now();
        self.phase = RunnerPhase::Running;
        let datapoints = match self.run_pass() {
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
            "InferenceRunner pass finished"
        );
        Ok(report)
    }

    fn run_pass(&mut self) -> Result<usize> {
        let plan = self
            .plan
            .as_mut()
            .ok_or_else(|| InferenceError::config("InferenceRunner is not set up"))?;

        for inf in &mut self.inferencers {
            inf.before_pass();
        }

        self.dataset.reset_state();
        let mut progress = PassProgress::new("InferenceRunner", self.dataset.size(), &self.config.progress);
        for dp in self.dataset.get_data() {
            if dp.len() != plan.input_names.len() {
                return Err(InferenceError::DatapointArity {
                    expected: plan.input_names.len(),
                    actual: dp.len(),
                });
            }
            let outputs = plan.predictor.predict(&dp)?;
            if outputs.len() != plan.output_names.len() {
                return Err(InferenceError::OutputArity {
                    expected: plan.output_names.len(),
                    actual: outputs.len(),
                });
            }
            dispatch_datapoint(&mut self.inferencers, &plan.routes, &outputs, &dp)?;
            progress.step();
        }
        Ok(progress.current())
    }
}
