// SPDX-License-Identifier: MIT OR Apache-2.0

//! The left-fold-as-a-function adapter.

use super::{Function, SharedFunction};
use crate::core::error::{FluxError, FluxResult};
use crate::core::event::Value;

/// A binary function paired with a seed value.
///
/// This is the configuration of a running fold: `acc_0 = seed`,
/// `acc_n = f(acc_{n-1}, x_n)`. The adapter itself is stateless; the
/// accumulator lives in the processor that drives it, so a function value
/// can be shared between any number of processor instances.
#[derive(Clone)]
pub struct CumulativeFunction {
    function: SharedFunction,
    seed: Value,
    name: String,
}

impl CumulativeFunction {
    /// Wraps a binary function. Fails with `ArityMismatch` when the wrapped
    /// function is not 2-in/1-out.
    pub fn new(function: SharedFunction, seed: impl Into<Value>) -> FluxResult<Self> {
        if function.input_arity() != 2 || function.output_arity() != 1 {
            return Err(FluxError::arity_mismatch(
                format!("CumulativeFunction({})", function.name()),
                2,
                function.input_arity(),
            ));
        }
        let name = format!("Cumulative({})", function.name());
        Ok(Self {
            function,
            seed: seed.into(),
            name,
        })
    }

    pub fn seed(&self) -> &Value {
        &self.seed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &SharedFunction {
        &self.function
    }

    /// One fold step: `f(accumulator, input)`.
    pub fn step(&self, accumulator: &Value, input: &Value) -> FluxResult<Value> {
        let mut outputs = self
            .function
            .evaluate(&[accumulator.clone(), input.clone()])?;
        // Arity was validated at construction; evaluate returned exactly one.
        outputs
            .pop()
            .ok_or_else(|| FluxError::arity_mismatch(self.name.clone(), 1, 0))
    }
}

impl std::fmt::Debug for CumulativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CumulativeFunction")
            .field("function", &self.function.name())
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::{Addition, And, Not};

    #[test]
    fn test_fold_steps() {
        let sum = CumulativeFunction::new(Addition::instance(), 0i64).unwrap();
        let acc1 = sum.step(sum.seed(), &Value::Int(3)).unwrap();
        let acc2 = sum.step(&acc1, &Value::Int(4)).unwrap();
        assert_eq!(acc1, Value::Int(3));
        assert_eq!(acc2, Value::Int(7));
    }

    #[test]
    fn test_rejects_non_binary_function() {
        let err = CumulativeFunction::new(Not::instance(), true).unwrap_err();
        assert!(matches!(err, FluxError::ArityMismatch { .. }));
    }

    #[test]
    fn test_step_propagates_type_mismatch() {
        let conjunction = CumulativeFunction::new(And::instance(), true).unwrap();
        let err = conjunction.step(conjunction.seed(), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, FluxError::TypeMismatch { .. }));
    }
}
