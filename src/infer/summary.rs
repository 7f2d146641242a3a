//! Summary emission after a full pass

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::{Inferencer, SummarySink};

/// Statistic that was not forwarded because it is not a scalar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStatistic {
    pub inferencer: String,
    pub metric: String,
    pub reason: String,
}

/// Outcome of one summary emission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Number of scalars forwarded to the sink
    pub emitted: usize,
    pub skipped: Vec<SkippedStatistic>,
}

/// Finalize every inferencer and forward its scalar statistics.
///
/// Entries that do not convert to `f64` are logged and skipped; they never
/// abort the emission of the remaining entries.
pub fn write_summaries<S: SummarySink + ?Sized>(
    sink: &mut S,
    inferencers: &mut [Box<dyn Inferencer>],
) -> SummaryReport {
    let mut report = SummaryReport::default();
    for inf in inferencers.iter_mut() {
        for (metric, stat) in inf.after_pass() {
            match stat.to_scalar() {
                Ok(value) => {
                    sink.add_scalar_summary(&metric, value);
                    report.emitted += 1;
                }
                Err(e) => {
                    warn!(
                        inferencer = inf.name(),
                        metric = %metric,
                        "{} returns a non-scalar statistic: {e}",
                        inf.name()
                    );
                    report.skipped.push(SkippedStatistic {
                        inferencer: inf.name().to_string(),
                        metric,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    report
}

/// A recorded scalar summary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarSummary {
    pub name: String,
    pub value: f64,
}

/// In-memory summary sink
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScalarSummaries {
    records: Vec<ScalarSummary>,
}

impl ScalarSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded summaries in arrival order
    pub fn records(&self) -> &[ScalarSummary] {
        &self.records
    }

    /// Most recent value recorded under `name`
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.records.iter().rev().find(|r| r.name == name).map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get records as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }
}

impl SummarySink for ScalarSummaries {
    fn add_scalar_summary(&mut self, name: &str, value: f64) {
        self.records.push(ScalarSummary { name: name.to_string(), value });
    }
}
