//! Input/output residency of requested tensors
//!
//! A requested name is either already present in the datapoint fed to the
//! graph (input-resident) or has to be computed by evaluating the graph
//! (output-resident). Output slots are numbered densely over the output-resident
//! names only, which is the order the predictor returns them in.

use std::collections::HashMap;

use crate::error::{InferenceError, Result};
use crate::tensor::{TensorName, TensorValue};

use super::dispatcher::DispatchPlan;

/// Where to read one requested value from at each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoTensorRef {
    /// Index into the datapoint (input feed) vector
    Input(usize),
    /// Index into the evaluated output vector
    Output(usize),
}

impl IoTensorRef {
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output(_))
    }

    pub fn index(&self) -> usize {
        match *self {
            Self::Input(i) | Self::Output(i) => i,
        }
    }

    /// Pick the referenced value out of this step's vectors.
    pub fn resolve<'a>(
        &self,
        outputs: &'a [TensorValue],
        inputs: &'a [TensorValue],
    ) -> Option<&'a TensorValue> {
        match *self {
            Self::Output(i) => outputs.get(i),
            Self::Input(i) => inputs.get(i),
        }
    }
}

/// Residency of every name in a [`DispatchPlan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorClassification {
    output_names: Vec<TensorName>,
    lookup: HashMap<TensorName, IoTensorRef>,
}

impl TensorClassification {
    /// Partition `all_names` against the declared input names.
    ///
    /// Input references point at the first occurrence of the name in
    /// `input_names`. Output names keep their relative order from `all_names`.
    pub fn new(all_names: &[TensorName], input_names: &[TensorName]) -> Self {
        let mut input_pos: HashMap<&TensorName, usize> = HashMap::new();
        for (i, name) in input_names.iter().enumerate() {
            input_pos.entry(name).or_insert(i);
        }

        let mut output_names = Vec::new();
        let mut lookup = HashMap::with_capacity(all_names.len());
        for name in all_names {
            let r = match input_pos.get(name) {
                Some(&i) => IoTensorRef::Input(i),
                None => {
                    output_names.push(name.clone());
                    IoTensorRef::Output(output_names.len() - 1)
                }
            };
            lookup.insert(name.clone(), r);
        }

        Self { output_names, lookup }
    }

    /// Names that must be computed, in fetch order
    pub fn output_names(&self) -> &[TensorName] {
        &self.output_names
    }

    /// Reference for one name, if it was part of the classified set
    pub fn get(&self, name: &TensorName) -> Option<IoTensorRef> {
        self.lookup.get(name).copied()
    }

    /// First input-resident name in the lookup order of `names`, if any.
    pub fn first_input_resident<'a>(&self, names: &'a [TensorName]) -> Option<&'a TensorName> {
        names.iter().find(|n| matches!(self.get(n), Some(IoTensorRef::Input(_))))
    }

    /// Per-entry references, same length and order as each entry's request.
    pub fn route(&self, plan: &DispatchPlan) -> Result<Vec<Vec<IoTensorRef>>> {
        plan.get_names_for_each_entry()
            .iter()
            .map(|entry| {
                entry
                    .iter()
                    .map(|n| {
                        self.get(n).ok_or_else(|| InferenceError::UnknownTensor { name: n.to_string() })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<TensorName> {
        v.iter().map(|n| TensorName::parse(n)).collect()
    }

    #[test]
    fn test_loss_acc_pred_scenario() {
        let plan = DispatchPlan::from_entries([vec!["loss", "acc"], vec!["acc", "pred"]]);
        assert_eq!(plan.get_all_names(), names(&["loss", "acc", "pred"]).as_slice());

        let cls = TensorClassification::new(plan.get_all_names(), &names(&["pred"]));
        let refs = cls.route(&plan).unwrap();

        assert_eq!(refs[0], vec![IoTensorRef::Output(0), IoTensorRef::Output(1)]);
        assert_eq!(refs[1], vec![IoTensorRef::Output(1), IoTensorRef::Input(0)]);
        assert_eq!(cls.output_names(), names(&["loss", "acc"]).as_slice());
    }

    #[test]
    fn test_output_indices_skip_inputs() {
        // Naively reusing positions in all_names would give "b" index 2.
        let all = names(&["x", "a", "y", "b"]);
        let cls = TensorClassification::new(&all, &names(&["label", "x", "y"]));

        assert_eq!(cls.get(&TensorName::parse("x")), Some(IoTensorRef::Input(1)));
        assert_eq!(cls.get(&TensorName::parse("y")), Some(IoTensorRef::Input(2)));
        assert_eq!(cls.get(&TensorName::parse("a")), Some(IoTensorRef::Output(0)));
        assert_eq!(cls.get(&TensorName::parse("b")), Some(IoTensorRef::Output(1)));
    }

    #[test]
    fn test_duplicate_input_names_use_first_position() {
        let cls = TensorClassification::new(&names(&["img"]), &names(&["img", "img"]));
        assert_eq!(cls.get(&TensorName::parse("img")), Some(IoTensorRef::Input(0)));
    }

    #[test]
    fn test_resolve_picks_the_right_vector() {
        let outputs = vec![TensorValue::from_elem(ndarray::IxDyn(&[1]), 1.0)];
        let inputs = vec![TensorValue::from_elem(ndarray::IxDyn(&[1]), 2.0)];

        assert_eq!(IoTensorRef::Output(0).resolve(&outputs, &inputs), Some(&outputs[0]));
        assert_eq!(IoTensorRef::Input(0).resolve(&outputs, &inputs), Some(&inputs[0]));
        assert_eq!(IoTensorRef::Input(1).resolve(&outputs, &inputs), None);
    }

    #[test]
    fn test_first_input_resident() {
        let all = names(&["a", "label"]);
        let cls = TensorClassification::new(&all, &names(&["label"]));
        assert_eq!(cls.first_input_resident(&all), Some(&TensorName::parse("label")));

        let none = TensorClassification::new(&all, &[]);
        assert_eq!(none.first_input_resident(&all), None);
    }
}
