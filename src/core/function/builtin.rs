// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in boolean and arithmetic functions.
//!
//! The zero-configuration functions expose a shared instance through
//! `instance()`. Sharing only caches the allocation: every instance is
//! immutable and equal-by-value, and constructing fresh ones is just as
//! correct.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{check_arity, expect_bool, expect_number, Function, SharedFunction};
use crate::core::error::FluxResult;
use crate::core::event::Value;

macro_rules! shared_instance {
    ($ty:ident) => {
        impl $ty {
            /// Shared instance of this function.
            pub fn instance() -> SharedFunction {
                static INSTANCE: Lazy<Arc<$ty>> = Lazy::new(|| Arc::new($ty));
                let concrete: Arc<$ty> = Arc::clone(&*INSTANCE);
                let shared: SharedFunction = concrete;
                shared
            }
        }
    };
}

/// Logical conjunction of two booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct And;

impl Function for And {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 2, inputs)?;
        let left = expect_bool(self.name(), &inputs[0])?;
        let right = expect_bool(self.name(), &inputs[1])?;
        Ok(vec![Value::Bool(left && right)])
    }

    fn input_arity(&self) -> usize {
        2
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "And"
    }
}

shared_instance!(And);

/// Logical disjunction of two booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Or;

impl Function for Or {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 2, inputs)?;
        let left = expect_bool(self.name(), &inputs[0])?;
        let right = expect_bool(self.name(), &inputs[1])?;
        Ok(vec![Value::Bool(left || right)])
    }

    fn input_arity(&self) -> usize {
        2
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Or"
    }
}

shared_instance!(Or);

/// Logical negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Not;

impl Function for Not {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 1, inputs)?;
        let operand = expect_bool(self.name(), &inputs[0])?;
        Ok(vec![Value::Bool(!operand)])
    }

    fn input_arity(&self) -> usize {
        1
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Not"
    }
}

shared_instance!(Not);

/// Logical implication: `left -> right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Implication;

impl Function for Implication {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 2, inputs)?;
        let antecedent = expect_bool(self.name(), &inputs[0])?;
        let consequent = expect_bool(self.name(), &inputs[1])?;
        Ok(vec![Value::Bool(!antecedent || consequent)])
    }

    fn input_arity(&self) -> usize {
        2
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Implication"
    }
}

shared_instance!(Implication);

/// Numeric addition. Two integers stay integral, otherwise widens to float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addition;

impl Function for Addition {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 2, inputs)?;
        if let (Value::Int(a), Value::Int(b)) = (&inputs[0], &inputs[1]) {
            return Ok(vec![Value::Int(a.wrapping_add(*b))]);
        }
        let a = expect_number(self.name(), &inputs[0])?;
        let b = expect_number(self.name(), &inputs[1])?;
        Ok(vec![Value::Float(a + b)])
    }

    fn input_arity(&self) -> usize {
        2
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Addition"
    }
}

shared_instance!(Addition);

/// Numeric multiplication. Two integers stay integral, otherwise widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplication;

impl Function for Multiplication {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 2, inputs)?;
        if let (Value::Int(a), Value::Int(b)) = (&inputs[0], &inputs[1]) {
            return Ok(vec![Value::Int(a.wrapping_mul(*b))]);
        }
        let a = expect_number(self.name(), &inputs[0])?;
        let b = expect_number(self.name(), &inputs[1])?;
        Ok(vec![Value::Float(a * b)])
    }

    fn input_arity(&self) -> usize {
        2
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Multiplication"
    }
}

shared_instance!(Multiplication);

/// A nullary function producing a fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Function for Constant {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), 0, inputs)?;
        Ok(vec![self.value.clone()])
    }

    fn input_arity(&self) -> usize {
        0
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Constant"
    }

    fn lineage(&self, _output_index: usize) -> Vec<usize> {
        Vec::new()
    }
}

/// Projects one position out of an n-ary input front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentPlaceholder {
    arity: usize,
    index: usize,
}

impl ArgumentPlaceholder {
    /// `index` must lie inside the declared arity.
    pub fn new(arity: usize, index: usize) -> Self {
        assert!(index < arity, "placeholder index {index} outside arity {arity}");
        Self { arity, index }
    }
}

impl Function for ArgumentPlaceholder {
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>> {
        check_arity(self.name(), self.arity, inputs)?;
        Ok(vec![inputs[self.index].clone()])
    }

    fn input_arity(&self) -> usize {
        self.arity
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "ArgumentPlaceholder"
    }

    fn lineage(&self, _output_index: usize) -> Vec<usize> {
        vec![self.index]
    }
}
