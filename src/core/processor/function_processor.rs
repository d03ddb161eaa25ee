// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processor wrapping a pure function.

use std::fmt;

use crate::core::error::FluxResult;
use crate::core::event::Value;
use crate::core::function::{ArgumentPlaceholder, Function, SharedFunction};
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

/// A processor whose compute step delegates to a wrapped [`Function`].
///
/// Consumption is synchronized: a step runs only when every input queue has
/// a pending event, and consumes exactly one event per stream.
///
/// [`Function`]: crate::core::function::Function
pub struct FunctionProcessor {
    meta: ProcessorMeta,
    function: SharedFunction,
}

impl FunctionProcessor {
    pub fn new(function: SharedFunction) -> Self {
        let meta = ProcessorMeta::new(function.name().to_string(), function.input_arity());
        Self { meta, function }
    }

    /// 1-in/1-out identity processor, the usual graph entry point for an
    /// externally driven stream.
    pub fn passthrough() -> Self {
        Self::new(std::sync::Arc::new(ArgumentPlaceholder::new(1, 0)))
    }

    pub fn function(&self) -> &SharedFunction {
        &self.function
    }
}

impl Processor for FunctionProcessor {
    fn id(&self) -> ProcessorId {
        self.meta.id()
    }

    fn name(&self) -> &str {
        self.meta.name()
    }

    fn input_arity(&self) -> usize {
        self.function.input_arity()
    }

    fn output_arity(&self) -> usize {
        self.function.output_arity()
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
        // Evaluate before consuming anything: a failing call must leave the
        // queues exactly as they were.
        let outputs = self.function.evaluate(&inputs)?;
        self.meta.pop_front();
        let step = self.meta.next_output_index();
        if self.meta.has_tracker() {
            for output_port in 0..outputs.len() {
                let deps = self
                    .function
                    .lineage(output_port)
                    .into_iter()
                    .map(|input_port| {
                        ProvenanceNode::Event(EventRef::input(
                            self.meta.id(),
                            input_port,
                            self.meta.current_input_index(input_port),
                        ))
                    })
                    .collect();
                self.meta.associate_output(output_port, step, deps);
            }
        }
        log::trace!("[{}] step {} -> {:?}", self.meta.id(), step, outputs);
        Ok(Some(outputs))
    }

    fn reset(&mut self) {
        self.meta.reset();
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(Self::new(self.function.clone()))
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for FunctionProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionProcessor")
            .field("meta", &self.meta)
            .field("function", &self.function.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FluxError;
    use crate::core::function::And;
    use crate::core::provenance::{EventTracker, LineageTracker};

    #[test]
    fn test_compute_waits_for_all_streams() {
        let mut p = FunctionProcessor::new(And::instance());
        p.enqueue(0, Value::Bool(true)).unwrap();
        assert!(!p.ready());
        assert!(p.compute().unwrap().is_none());

        p.enqueue(1, Value::Bool(false)).unwrap();
        assert!(p.ready());
        let out = p.compute().unwrap().unwrap();
        assert_eq!(out, vec![Value::Bool(false)]);
    }

    #[test]
    fn test_failed_compute_preserves_queues() {
        let mut p = FunctionProcessor::new(And::instance());
        p.enqueue(0, Value::Bool(true)).unwrap();
        p.enqueue(1, Value::Int(9)).unwrap();
        let err = p.compute().unwrap_err();
        assert!(matches!(err, FluxError::TypeMismatch { .. }));
        // Nothing consumed, nothing produced
        assert_eq!(p.meta.pending(0), 1);
        assert_eq!(p.meta.pending(1), 1);
        assert_eq!(p.meta.produced(), 0);
    }

    #[test]
    fn test_provenance_records_all_inputs_per_step() {
        let tracker = LineageTracker::shared();
        let mut p = FunctionProcessor::new(And::instance());
        p.set_tracker(Some(tracker.clone()));

        for step in 0..2u64 {
            p.enqueue(0, Value::Bool(true)).unwrap();
            p.enqueue(1, Value::Bool(true)).unwrap();
            p.compute().unwrap();
            let deps = tracker
                .lock()
                .unwrap()
                .dependencies_of(&EventRef::output(p.id(), 0, step));
            assert_eq!(
                deps,
                vec![
                    ProvenanceNode::Event(EventRef::input(p.id(), 0, step)),
                    ProvenanceNode::Event(EventRef::input(p.id(), 1, step)),
                ]
            );
        }
    }

    #[test]
    fn test_clone_gets_fresh_identity_and_state() {
        let mut p = FunctionProcessor::new(And::instance());
        p.enqueue(0, Value::Bool(true)).unwrap();
        let clone = p.clone_processor();
        assert_ne!(clone.id(), p.id());
        assert!(!clone.ready());
        assert_eq!(clone.name(), p.name());
    }
}
