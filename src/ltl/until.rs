// SPDX-License-Identifier: MIT OR Apache-2.0

//! The "until" operator.

use std::fmt;

use crate::core::error::{FluxError, FluxResult};
use crate::core::event::Value;
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

/// Three-valued intermediate truth state of an until evaluation.
///
/// Invariants: `left_holds` starts true and can only fall, `right_holds`
/// starts false and can only rise. `resolved_at` is the step at which one
/// of the two terminal conditions first held.
#[derive(Debug, Clone, Copy)]
struct UntilState {
    left_holds: bool,
    right_holds: bool,
    resolved_at: Option<u64>,
}

impl UntilState {
    fn initial() -> Self {
        Self {
            left_holds: true,
            right_holds: false,
            resolved_at: None,
        }
    }

    fn verdict(&self) -> Option<bool> {
        if self.right_holds {
            Some(true)
        } else if !self.left_holds {
            Some(false)
        } else {
            None
        }
    }
}

/// Evaluates `left U right` over a pair of boolean streams.
///
/// Each step consumes one event from both streams. Until either terminal
/// condition is reached the verdict is undetermined and the step produces
/// no output event. Once `right` has held, every subsequent step emits
/// `true`; once `left` has failed first, every subsequent step emits
/// `false`. The resolution is permanent: later inputs are consumed and
/// discarded.
pub struct UntilProcessor {
    meta: ProcessorMeta,
    state: UntilState,
}

impl Default for UntilProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl UntilProcessor {
    pub fn new() -> Self {
        Self {
            meta: ProcessorMeta::new("Until", 2),
            state: UntilState::initial(),
        }
    }

    /// Emit the terminal verdict, anchored in provenance to every input
    /// event consumed up to and including the resolving step.
    fn emit(&mut self, verdict: bool) -> FluxResult<Option<Vec<Value>>> {
        let step = self.meta.next_output_index();
        if self.meta.has_tracker() {
            let resolved_at = self.state.resolved_at.unwrap_or(0);
            let mut deps = Vec::with_capacity(2 * (resolved_at as usize + 1));
            for port in 0..2 {
                for index in 0..=resolved_at {
                    deps.push(ProvenanceNode::Event(EventRef::input(
                        self.meta.id(),
                        port,
                        index,
                    )));
                }
            }
            self.meta.associate_output(0, step, deps);
        }
        log::trace!("[{}] verdict {} at output {}", self.meta.id(), verdict, step);
        Ok(Some(vec![Value::Bool(verdict)]))
    }
}

impl Processor for UntilProcessor {
    fn id(&self) -> ProcessorId {
        self.meta.id()
    }

    fn name(&self) -> &str {
        self.meta.name()
    }

    fn input_arity(&self) -> usize {
        2
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

        if let Some(verdict) = self.state.verdict() {
            // Already resolved: the pair is consumed without inspection
            self.meta.pop_front();
            return self.emit(verdict);
        }

        // Type-check both operands before consuming anything
        let left = inputs[0].as_bool().ok_or_else(|| {
            FluxError::type_mismatch(self.meta.name(), "boolean", inputs[0].type_name())
        })?;
        let right = inputs[1].as_bool().ok_or_else(|| {
            FluxError::type_mismatch(self.meta.name(), "boolean", inputs[1].type_name())
        })?;
        self.meta.pop_front();
        let step = self.meta.current_input_index(0);

        self.state.right_holds |= right;
        self.state.left_holds &= left;
        match self.state.verdict() {
            Some(verdict) => {
                self.state.resolved_at = Some(step);
                self.emit(verdict)
            }
            // Still inconclusive: a valid outcome, not an error. Nothing is
            // forwarded downstream for this step.
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.meta.reset();
        self.state = UntilState::initial();
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(Self::new())
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for UntilProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntilProcessor")
            .field("meta", &self.meta)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provenance::{EventTracker, LineageTracker};

    /// Feed one (left, right) pair and return the step's outcome.
    fn step(p: &mut UntilProcessor, left: bool, right: bool) -> Option<bool> {
        p.enqueue(0, Value::Bool(left)).unwrap();
        p.enqueue(1, Value::Bool(right)).unwrap();
        p.compute()
            .unwrap()
            .map(|out| out[0].as_bool().unwrap())
    }

    #[test]
    fn test_undetermined_prefix_emits_nothing() {
        let mut p = UntilProcessor::new();
        assert_eq!(step(&mut p, true, false), None);
        assert_eq!(step(&mut p, true, false), None);
    }

    #[test]
    fn test_right_resolves_to_permanent_true() {
        // left=[t,t,f], right=[f,f,t]: right fires at step 2
        let mut p = UntilProcessor::new();
        assert_eq!(step(&mut p, true, false), None);
        assert_eq!(step(&mut p, true, false), None);
        assert_eq!(step(&mut p, false, true), Some(true));
        // Terminal success: any further input keeps emitting true
        assert_eq!(step(&mut p, false, false), Some(true));
        assert_eq!(step(&mut p, true, false), Some(true));
    }

    #[test]
    fn test_left_failure_resolves_to_permanent_false() {
        // left=[t,f,...], right=[f,f,...]: step 0 undetermined, step 1
        // fails the left operand
        let mut p = UntilProcessor::new();
        assert_eq!(step(&mut p, true, false), None);
        assert_eq!(step(&mut p, false, false), Some(false));
        assert_eq!(step(&mut p, true, true), Some(false));
    }

    #[test]
    fn test_simultaneous_right_wins() {
        // right_holds is folded before left_holds is checked, matching the
        // operator's success-first bias
        let mut p = UntilProcessor::new();
        assert_eq!(step(&mut p, false, true), Some(true));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut p = UntilProcessor::new();
        step(&mut p, false, false);
        p.reset();
        p.reset();
        assert_eq!(step(&mut p, true, false), None, "fresh state after reset");
    }

    #[test]
    fn test_type_mismatch_preserves_state_and_queues() {
        let mut p = UntilProcessor::new();
        p.enqueue(0, Value::Int(3)).unwrap();
        p.enqueue(1, Value::Bool(false)).unwrap();
        assert!(p.compute().is_err());
        assert!(p.ready(), "failed step must not consume the pair");
        assert_eq!(p.produced(), 0);
    }

    #[test]
    fn test_verdict_provenance_spans_resolving_prefix() {
        let tracker = LineageTracker::shared();
        let mut p = UntilProcessor::new();
        p.set_tracker(Some(tracker.clone()));

        step(&mut p, true, false);
        step(&mut p, true, true); // resolves at step 1
        step(&mut p, true, false); // terminal repeat

        let tracker = tracker.lock().unwrap();
        let first = tracker.dependencies_of(&EventRef::output(p.id(), 0, 0));
        // Both streams, steps 0 and 1
        assert_eq!(first.len(), 4);
        // The repeat verdict is determined by the same prefix
        let repeat = tracker.dependencies_of(&EventRef::output(p.id(), 0, 1));
        assert_eq!(repeat, first);
    }
}
