//! Canonical tensor names
//!
//! A graph value can be referred to in two ways: by the operation that produces
//! it (`scope/logits`) or by the tensor itself (`scope/logits:0`). Every lookup
//! in this crate compares names in tensor form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a graph tensor, always stored in tensor form (`op:index`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TensorName {
    op: String,
    output_index: usize,
}

impl TensorName {
    /// Parse either form. A trailing `:<digits>` selects the output index,
    /// anything else is an operation name and maps to output 0.
    pub fn parse(name: &str) -> Self {
        if let Some((op, idx)) = name.rsplit_once(':') {
            if !op.is_empty() && !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(output_index) = idx.parse() {
                    return Self { op: op.to_string(), output_index };
                }
            }
        }
        Self { op: name.to_string(), output_index: 0 }
    }

    /// Operation form, without the output index.
    pub fn op_name(&self) -> &str {
        &self.op
    }

    /// Output slot of the producing operation.
    pub fn output_index(&self) -> usize {
        self.output_index
    }

    /// First path segment of the operation name.
    ///
    /// Sparse inputs are made of several component ops under one scope
    /// (`label/indices`, `label/values`, ...); the scope is their feed key.
    pub fn group_key(&self) -> &str {
        self.op.split('/').next().unwrap_or(&self.op)
    }

    /// Same tensor, qualified by a tower or scope prefix.
    pub fn scoped(&self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self.clone();
        }
        Self { op: format!("{prefix}/{}", self.op), output_index: self.output_index }
    }
}

impl fmt::Display for TensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.op, self.output_index)
    }
}

impl From<&str> for TensorName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for TensorName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<TensorName> for String {
    fn from(name: TensorName) -> Self {
        name.to_string()
    }
}

/// Opaque reference to a tensor living in an execution context.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorHandle {
    name: TensorName,
}

impl TensorHandle {
    /// Handle for the tensor with the given canonical name.
    pub fn new(name: impl Into<TensorName>) -> Self {
        Self { name: name.into() }
    }

    /// Canonical name of the referenced tensor.
    pub fn name(&self) -> &TensorName {
        &self.name
    }
}
