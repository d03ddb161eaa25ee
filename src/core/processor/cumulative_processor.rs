// SPDX-License-Identifier: MIT OR Apache-2.0

//! The running-fold processor.

use std::fmt;

use crate::core::error::FluxResult;
use crate::core::event::Value;
use crate::core::function::CumulativeFunction;
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

/// Computes a running fold over a single input stream.
///
/// For a fold configuration `(f, seed)` the output sequence is
/// `acc_0 = f(seed, x_0)`, `acc_k = f(acc_{k-1}, x_k)`. The accumulator is
/// processor-local state: `None` until the first step folds the seed.
///
/// Lineage differs from a plain function processor because the accumulator
/// is this processor's own previous output: output `k` depends on input `k`
/// and on output `k-1`, and output `0` is anchored to the `StartValue`
/// marker standing in for the seed.
pub struct CumulativeProcessor {
    meta: ProcessorMeta,
    function: CumulativeFunction,
    accumulator: Option<Value>,
}

impl CumulativeProcessor {
    pub fn new(function: CumulativeFunction) -> Self {
        let meta = ProcessorMeta::new(function.name().to_string(), 1);
        Self {
            meta,
            function,
            accumulator: None,
        }
    }

    /// Current accumulator; `None` before the first event folds the seed.
    pub fn accumulator(&self) -> Option<&Value> {
        self.accumulator.as_ref()
    }
}

impl Processor for CumulativeProcessor {
    fn id(&self) -> ProcessorId {
        self.meta.id()
    }

    fn name(&self) -> &str {
        self.meta.name()
    }

    fn input_arity(&self) -> usize {
        1
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn enqueue(&mut self, port: usize, value: Value) -> FluxResult<u64> {
        self.meta.enqueue(port, value)
    }

    fn ready(&self) -> bool {
        self.meta.ready()
    }

    fn produced(&self) -> u64 {
        self.meta.produced()
    }

    fn compute(&mut self) -> FluxResult<Option<Vec<Value>>> {
        let Some(inputs) = self.meta.peek_front() else {
            return Ok(None);
        };
        let left = self.accumulator.as_ref().unwrap_or(self.function.seed());
        // Fold before mutating: a failing step leaves accumulator and queue
        // untouched so the push can be retried.
        let folded = self.function.step(left, &inputs[0])?;
        self.meta.pop_front();
        let step = self.meta.next_output_index();
        self.accumulator = Some(folded.clone());

        if self.meta.has_tracker() {
            // Output k depends on the current input event, and on the
            // previous output front when there is one. The first output has
            // no predecessor: the start value stands in for it.
            let mut deps = vec![ProvenanceNode::Event(EventRef::input(
                self.meta.id(),
                0,
                self.meta.current_input_index(0),
            ))];
            if step > 0 {
                deps.push(ProvenanceNode::Event(EventRef::output(
                    self.meta.id(),
                    0,
                    step - 1,
                )));
            } else {
                deps.push(ProvenanceNode::StartValue {
                    processor: self.meta.id(),
                    index: 0,
                });
            }
            self.meta.associate_output(0, step, deps);
        }
        log::trace!("[{}] fold step {} -> {:?}", self.meta.id(), step, folded);
        Ok(Some(vec![folded]))
    }

    fn reset(&mut self) {
        self.meta.reset();
        self.accumulator = None;
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(Self::new(self.function.clone()))
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for CumulativeProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CumulativeProcessor")
            .field("meta", &self.meta)
            .field("accumulator", &self.accumulator)
            .finish()
    }
}
