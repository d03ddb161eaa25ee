// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure, stateless value-tuple transformations.
//!
//! A [`Function`] maps an input tuple of values to an output tuple of
//! values. Evaluation is side-effect-free and idempotent for the same
//! inputs; all per-stream state lives in the processor that wraps the
//! function, never in the function itself.

pub mod builtin;
pub mod cumulative;

use std::sync::Arc;

use crate::core::error::{FluxError, FluxResult};
use crate::core::event::Value;

pub use builtin::{Addition, And, ArgumentPlaceholder, Constant, Implication, Multiplication, Not, Or};
pub use cumulative::CumulativeFunction;

/// A pure, arity-fixed computation over event values.
pub trait Function: Send + Sync {
    /// Evaluate the function on one input front.
    ///
    /// Fails with `ArityMismatch` when `inputs.len() != input_arity()` and
    /// with `TypeMismatch` when a value's runtime shape is outside the
    /// function's domain. All-or-nothing: on error no output is produced.
    fn evaluate(&self, inputs: &[Value]) -> FluxResult<Vec<Value>>;

    fn input_arity(&self) -> usize;

    fn output_arity(&self) -> usize;

    fn name(&self) -> &str;

    /// Which input positions output `output_index` depends on.
    ///
    /// The default is the conservative hint: every output depends on every
    /// input. Functions that ignore inputs (projections, constants) narrow
    /// this so lineage tracking stays precise.
    fn lineage(&self, output_index: usize) -> Vec<usize> {
        let _ = output_index;
        (0..self.input_arity()).collect()
    }
}

/// Shared handle to a function, the form processors store.
pub type SharedFunction = Arc<dyn Function>;

/// Checks the input count against the declared arity.
pub(crate) fn check_arity(name: &str, expected: usize, inputs: &[Value]) -> FluxResult<()> {
    if inputs.len() != expected {
        return Err(FluxError::arity_mismatch(name, expected, inputs.len()));
    }
    Ok(())
}

/// Coerces one input to a boolean or reports a `TypeMismatch`.
pub(crate) fn expect_bool(name: &str, value: &Value) -> FluxResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| FluxError::type_mismatch(name, "boolean", value.type_name()))
}

/// Coerces one input to a number or reports a `TypeMismatch`.
pub(crate) fn expect_number(name: &str, value: &Value) -> FluxResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| FluxError::type_mismatch(name, "number", value.type_name()))
}
