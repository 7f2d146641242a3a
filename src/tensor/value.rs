//! Tensor values and inferencer statistics

use ndarray::ArrayD;
use thiserror::Error;

/// Concrete value of one tensor for one datapoint.
pub type TensorValue = ArrayD<f32>;

/// One datapoint: a value per input name, in input-name order.
pub type Datapoint = Vec<TensorValue>;

/// Value reported by an inferencer at the end of a pass.
///
/// Only values that convert to a single `f64` are forwarded as scalar
/// summaries; anything else is diagnostic output and gets dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum Statistic {
    /// Floating-point scalar
    Scalar(f64),
    /// Integer count
    Count(i64),
    /// Free-form text, forwarded only if it parses as a number
    Text(String),
    /// Tensor-valued statistic, forwarded only if it has exactly one element
    Tensor(TensorValue),
}

/// Why a statistic could not be turned into a scalar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatisticError {
    #[error("text value '{0}' is not a number")]
    NotNumeric(String),

    #[error("tensor statistic has {0} elements, expected 1")]
    NotScalarTensor(usize),
}

impl Statistic {
    /// Attempt to convert to a floating-point scalar.
    pub fn to_scalar(&self) -> Result<f64, StatisticError> {
        match self {
            Self::Scalar(v) => Ok(*v),
            Self::Count(v) => Ok(*v as f64),
            Self::Text(s) => {
                s.trim().parse::<f64>().map_err(|_| StatisticError::NotNumeric(s.clone()))
            }
            Self::Tensor(t) => match t.len() {
                1 => t.iter().next().map(|&v| f64::from(v)).ok_or(StatisticError::NotScalarTensor(0)),
                n => Err(StatisticError::NotScalarTensor(n)),
            },
        }
    }
}

impl From<f64> for Statistic {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<f32> for Statistic {
    fn from(v: f32) -> Self {
        Self::Scalar(f64::from(v))
    }
}

impl From<i64> for Statistic {
    fn from(v: i64) -> Self {
        Self::Count(v)
    }
}

impl From<usize> for Statistic {
    fn from(v: usize) -> Self {
        Self::Count(v as i64)
    }
}

impl From<&str> for Statistic {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Statistic {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<TensorValue> for Statistic {
    fn from(v: TensorValue) -> Self {
        Self::Tensor(v)
    }
}
