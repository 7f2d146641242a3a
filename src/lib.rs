//! Inference-time evaluation callbacks for training loops
//!
//! At trigger points chosen by the training loop, a runner pushes held-out
//! data through the trained graph, collects the tensors each inferencer asked
//! for and forwards the inferencers' scalar statistics to the trainer's
//! summary sink.
//!
//! - [`infer::InferenceRunner`] feeds datapoints from a dataset explicitly
//! - [`infer::FeedfreeInferenceRunner`] drives an evaluation tower from an
//!   input pipeline wired into the graph
//!
//! Statistics themselves are computed by [`infer::Inferencer`] plugins.

pub mod config;
pub mod error;
pub mod infer;
pub mod tensor;

pub use config::{FeedfreeRunnerConfig, InferenceRunnerConfig, ProgressConfig};
pub use error::{InferenceError, Result};
pub use infer::{FeedfreeInferenceRunner, InferenceRunner, Inferencer};
pub use tensor::{Statistic, TensorName, TensorValue};
