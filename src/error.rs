//! Error types for inference passes
//!
//! Configuration errors surface at construction or setup and indicate a caller
//! bug. Runtime errors abort the current pass; the next trigger starts over.

use thiserror::Error;

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors raised while planning or running an inference pass.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Feedfree input pipeline cannot report how many steps make up a pass.
    #[error("Input pipeline has no size: {reason}\n  → Feedfree inference needs a finite pipeline that reports its element count")]
    UnsizedInput { reason: String },

    /// Configuration path that is not implemented.
    #[error("Unsupported configuration: {feature}\n  → Remove the option or use the fed InferenceRunner instead")]
    Unsupported { feature: String },

    /// Pipeline tensors do not line up with the model's declared inputs.
    #[error("Input tensor count mismatch: model declares {expected} inputs, pipeline provides {actual}")]
    InputCountMismatch { expected: usize, actual: usize },

    /// Feedfree inferencer asked for a value that only exists on the input side.
    #[error("Inferencer requested input tensor '{name}' in feedfree mode\n  → Feedfree passes can only fetch computed outputs")]
    InputTensorRequested { name: String },

    /// Two feedfree runners attempted to build the same tower.
    #[error("Tower '{name}' already exists in the graph\n  → Give each FeedfreeInferenceRunner a distinct prefix")]
    DuplicateTower { name: String },

    /// Graph has no tensor with this fully-qualified name.
    #[error("Unknown tensor '{name}'")]
    UnknownTensor { name: String },

    /// Datapoint does not carry one value per input name.
    #[error("Datapoint has {actual} components, expected {expected} (one per input name)")]
    DatapointArity { expected: usize, actual: usize },

    /// Evaluation returned a result vector of the wrong length.
    #[error("Evaluation returned {actual} outputs, expected {expected}")]
    OutputArity { expected: usize, actual: usize },

    /// Predictor failed on a datapoint.
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// Graph construction or session execution failed.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Invalid runner configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl InferenceError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Errors that indicate a wiring mistake rather than a runtime failure.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnsizedInput { .. }
                | Self::Unsupported { .. }
                | Self::InputCountMismatch { .. }
                | Self::InputTensorRequested { .. }
                | Self::DuplicateTower { .. }
                | Self::UnknownTensor { .. }
                | Self::Config { .. }
        )
    }

    /// Stable error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsizedInput { .. } => "E001",
            Self::Unsupported { .. } => "E002",
            Self::InputCountMismatch { .. } => "E003",
            Self::InputTensorRequested { .. } => "E004",
            Self::DuplicateTower { .. } => "E005",
            Self::UnknownTensor { .. } => "E006",
            Self::Config { .. } => "E007",
            Self::DatapointArity { .. } => "E010",
            Self::OutputArity { .. } => "E011",
            Self::Prediction(_) => "E020",
            Self::Execution(_) => "E021",
        }
    }
}

impl From<serde_yaml::Error> for InferenceError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(err.to_string())
    }
}
