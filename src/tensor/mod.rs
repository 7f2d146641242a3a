//! Tensor names, handles and values exchanged with the execution runtime

mod name;
mod value;

pub use name::{TensorHandle, TensorName};
pub use value::{Datapoint, Statistic, StatisticError, TensorValue};
