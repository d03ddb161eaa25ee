// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateful stream-to-stream transformation nodes.
//!
//! A processor owns one FIFO queue per input stream and an output-event
//! counter. The graph enqueues events into it and invokes [`Processor::compute`]
//! once the node is ready; a compute step consumes one event per input
//! stream and produces at most one output front. Internal state is reached
//! only through the processor's own methods.

pub mod cumulative_processor;
pub mod function_processor;
pub mod sink;

use std::collections::VecDeque;
use std::fmt;

use uuid::Uuid;

use crate::core::error::{FluxError, FluxResult, PortDirection};
use crate::core::event::Value;
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

pub use cumulative_processor::CumulativeProcessor;
pub use function_processor::FunctionProcessor;
pub use sink::CollectorSink;

/// Stable identity of a processor, assigned at construction.
///
/// Ids anchor provenance records, so cloning a processor always yields a
/// fresh id: the clone's events are distinct from the original's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessorId(Uuid);

impl ProcessorId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A stateful node in a processor graph.
pub trait Processor: Send + fmt::Debug {
    fn id(&self) -> ProcessorId;

    fn name(&self) -> &str;

    fn input_arity(&self) -> usize;

    fn output_arity(&self) -> usize;

    /// Append one event to an input queue. Returns the 0-based index the
    /// event occupies on that stream.
    fn enqueue(&mut self, port: usize, value: Value) -> FluxResult<u64>;

    /// Whether a compute step can run: every input queue holds at least one
    /// pending event. Nodes without inputs are never ready; they are driven
    /// externally.
    fn ready(&self) -> bool;

    /// Output fronts produced so far. The counter is what correlates a
    /// produced event with its position for provenance.
    fn produced(&self) -> u64;

    /// Run one compute step.
    ///
    /// `Ok(Some(outputs))` delivers one event per output port.
    /// `Ok(None)` is a legitimately undetermined step (nothing forwarded):
    /// either the node was not ready, or the operator has no verdict yet.
    /// On `Err` the processor's queues and state are exactly as before the
    /// call, so a corrected retry is possible.
    fn compute(&mut self) -> FluxResult<Option<Vec<Value>>>;

    /// Return to the initial internal state: queues, counters and operator
    /// state cleared, identity and wiring preserved.
    fn reset(&mut self);

    /// Independent copy with fresh state, fresh id, same configuration.
    fn clone_processor(&self) -> Box<dyn Processor>;

    /// Attach or detach a provenance tracker. With `None` every lineage
    /// bookkeeping step is skipped; produced values are identical either way.
    fn set_tracker(&mut self, tracker: Option<SharedTracker>);
}

/// Per-processor bookkeeping shared by all processor implementations:
/// identity, input queues, consumed/produced counters and the tracker hook.
pub struct ProcessorMeta {
    id: ProcessorId,
    name: String,
    queues: Vec<VecDeque<Value>>,
    consumed: Vec<u64>,
    produced: u64,
    tracker: Option<SharedTracker>,
}

impl ProcessorMeta {
    pub fn new(name: impl Into<String>, input_arity: usize) -> Self {
        Self {
            id: ProcessorId::fresh(),
            name: name.into(),
            queues: (0..input_arity).map(|_| VecDeque::new()).collect(),
            consumed: vec![0; input_arity],
            produced: 0,
            tracker: None,
        }
    }

    pub fn id(&self) -> ProcessorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_arity(&self) -> usize {
        self.queues.len()
    }

    /// Number of events waiting on one input stream.
    pub fn pending(&self, port: usize) -> usize {
        self.queues.get(port).map_or(0, VecDeque::len)
    }

    pub fn enqueue(&mut self, port: usize, value: Value) -> FluxResult<u64> {
        let arity = self.queues.len();
        let queue = self.queues.get_mut(port).ok_or(FluxError::PortOutOfRange {
            id: self.id,
            port,
            arity,
            direction: PortDirection::Input,
        })?;
        let index = self.consumed[port] + queue.len() as u64;
        queue.push_back(value);
        Ok(index)
    }

    pub fn ready(&self) -> bool {
        !self.queues.is_empty() && self.queues.iter().all(|q| !q.is_empty())
    }

    /// Clones the front event of every queue without consuming anything.
    /// `None` when not ready.
    pub fn peek_front(&self) -> Option<Vec<Value>> {
        if !self.ready() {
            return None;
        }
        Some(self.queues.iter().map(|q| q[0].clone()).collect())
    }

    /// Consumes one event per queue. Call only after `ready()`.
    pub fn pop_front(&mut self) {
        for (port, queue) in self.queues.iter_mut().enumerate() {
            if queue.pop_front().is_some() {
                self.consumed[port] += 1;
            }
        }
    }

    /// Events consumed so far on one input stream.
    pub fn consumed(&self, port: usize) -> u64 {
        self.consumed.get(port).copied().unwrap_or(0)
    }

    /// Output fronts produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Index of the input event consumed by the current step on `port`.
    /// Valid right after `pop_front`.
    pub fn current_input_index(&self, port: usize) -> u64 {
        self.consumed(port).saturating_sub(1)
    }

    /// Claims the next output index, incrementing the produced counter.
    pub fn next_output_index(&mut self) -> u64 {
        let index = self.produced;
        self.produced += 1;
        index
    }

    pub fn reset(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
        for count in &mut self.consumed {
            *count = 0;
        }
        self.produced = 0;
    }

    pub fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.tracker = tracker;
    }

    pub fn has_tracker(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn tracker(&self) -> Option<&SharedTracker> {
        self.tracker.as_ref()
    }

    /// Records that this processor's output event depends on `deps`.
    /// No-op when no tracker is attached.
    pub fn associate_output(&self, port: usize, index: u64, deps: Vec<ProvenanceNode>) {
        if let Some(tracker) = &self.tracker {
            if let Ok(mut tracker) = tracker.lock() {
                tracker.associate(EventRef::output(self.id, port, index), deps);
            } else {
                log::error!("[{}] provenance tracker mutex poisoned, association lost", self.id);
            }
        }
    }
}

impl fmt::Debug for ProcessorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorMeta")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("input_arity", &self.queues.len())
            .field("pending", &self.queues.iter().map(VecDeque::len).collect::<Vec<_>>())
            .field("consumed", &self.consumed)
            .field("produced", &self.produced)
            .field("tracked", &self.tracker.is_some())
            .finish()
    }
}
