//! Pieces shared by both runners: lifecycle phase, pass report, routing

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};
use crate::tensor::TensorValue;

use super::classify::IoTensorRef;
use super::summary::SummaryReport;
use super::traits::Inferencer;

/// Lifecycle of a runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunnerPhase {
    /// Not attached to a trainer yet
    Idle,
    /// Fetch plan built, ready to run a pass
    Setup,
    /// Pass in progress
    Running,
    /// Last pass finished and summaries were written
    Done,
}

/// What one triggered pass did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// Datapoints routed to the inferencers
    pub datapoints: usize,
    /// Statistics forwarded to the sink and those skipped
    pub summary: SummaryReport,
    /// Wall-clock duration of the pass, summaries included
    pub elapsed_secs: f64,
}

/// Hand one step's values to every inferencer in its requested order.
pub(crate) fn dispatch_datapoint(
    inferencers: &mut [Box<dyn Inferencer>],
    routes: &[Vec<IoTensorRef>],
    outputs: &[TensorValue],
    inputs: &[TensorValue],
) -> Result<()> {
    for (inf, refs) in inferencers.iter_mut().zip(routes) {
        let values = refs
            .iter()
            .map(|r| {
                r.resolve(outputs, inputs).ok_or_else(|| match r {
                    IoTensorRef::Output(_) => InferenceError::OutputArity {
                        expected: r.index() + 1,
                        actual: outputs.len(),
                    },
                    IoTensorRef::Input(_) => InferenceError::DatapointArity {
                        expected: r.index() + 1,
                        actual: inputs.len(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        inf.on_datapoint(&values);
    }
    Ok(())
}
