//! Periodic inference passes over held-out data
//!
//! Two runners share the same planning core:
//! - `InferenceRunner` feeds datapoints from a [`Dataset`] to a predictor
//! - `FeedfreeInferenceRunner` evaluates a tower driven by an [`InputPipeline`]
//!
//! Both collect every inferencer's requested names into one deduplicated fetch
//! list, evaluate it once per step and route the values back per inferencer.
//!
//! # Example
//!
//! ```rust
//! use inferir::infer::{DispatchPlan, IoTensorRef, TensorClassification};
//! use inferir::tensor::TensorName;
//!
//! let plan = DispatchPlan::from_entries([vec!["loss", "acc"], vec!["acc", "pred"]]);
//! let inputs = [TensorName::parse("pred")];
//! let classification = TensorClassification::new(plan.get_all_names(), &inputs);
//!
//! let routes = classification.route(&plan).unwrap();
//! assert_eq!(routes[1], vec![IoTensorRef::Output(1), IoTensorRef::Input(0)]);
//! ```

mod classify;
mod dataset;
mod dispatcher;
mod feedfree;
mod pass;
mod progress;
mod runner;
mod schedule;
mod summary;
mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{IoTensorRef, TensorClassification};
pub use dataset::InMemoryDataset;
pub use dispatcher::{DispatchPlan, OutputTensorDispatcher};
pub use feedfree::{predict_tower_name, FeedfreeInferenceRunner};
pub use pass::{PassReport, RunnerPhase};
pub use progress::{format_duration, KalmanEta, PassProgress};
pub use runner::InferenceRunner;
pub use schedule::{TriggerContext, TriggerSchedule};
pub use summary::{write_summaries, ScalarSummaries, ScalarSummary, SkippedStatistic, SummaryReport};
pub use traits::{
    Dataset, ExecutionContext, Inferencer, InputPipeline, Model, Placeholder, PlaceholderKind,
    Predictor, SummarySink, TowerSpec, TrainerHandle,
};
