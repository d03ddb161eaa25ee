// SPDX-License-Identifier: MIT OR Apache-2.0

//! The connector graph: processor ownership, wiring and push-driven
//! evaluation.
//!
//! Evaluation is single-threaded and cooperative. An external driver pushes
//! an event into a registered processor; the graph then synchronously steps
//! every processor whose input queues became satisfied, delivering each
//! produced front along the edge table, until no processor is ready. There
//! is no scheduler and nothing suspends: "waiting" is queue state that
//! persists until the next push. Topology mutation is a construction-time
//! activity and must not be interleaved with pushes.

pub mod builder;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::core::error::{FluxError, FluxResult, PortDirection};
use crate::core::event::Value;
use crate::core::processor::{Processor, ProcessorId};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

pub use builder::{BuildCommand, GraphBuilder, Handle};

/// What to do when an input port already has a producer bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Reject the connection. The default: silent overwrites hide wiring
    /// mistakes.
    #[default]
    Forbid,
    /// Drop the existing binding first (last-wins priority wiring).
    Replace,
    /// Keep every binding; deliveries append to the consumer queue in
    /// arrival order (true streaming fan-in).
    Append,
}

type Endpoint = (ProcessorId, usize);

/// How the graph owns a processor: shared so traversals can inspect nodes
/// while the drain loop steps them, locked because compute mutates.
type ProcessorCell = Arc<Mutex<Box<dyn Processor>>>;

/// Directed wiring between processor ports, plus ownership of every
/// participating processor.
#[derive(Default)]
pub struct ProcessorGraph {
    processors: HashMap<ProcessorId, ProcessorCell>,
    order: Vec<ProcessorId>,
    edges: HashMap<Endpoint, Vec<Endpoint>>,
    inbound: HashMap<Endpoint, Vec<Endpoint>>,
    tracker: Option<SharedTracker>,
}

enum Step {
    NotReady,
    NoOutput,
    Front(Vec<Value>, u64),
}

impl ProcessorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor, transferring ownership to the graph.
    pub fn add<P: Processor + 'static>(&mut self, processor: P) -> ProcessorId {
        self.add_boxed(Box::new(processor))
    }

    pub fn add_boxed(&mut self, mut processor: Box<dyn Processor>) -> ProcessorId {
        let id = processor.id();
        processor.set_tracker(self.tracker.clone());
        log::debug!("[graph] add {} '{}'", id, processor.name());
        self.processors.insert(id, Arc::new(Mutex::new(processor)));
        self.order.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: ProcessorId) -> bool {
        self.processors.contains_key(&id)
    }

    /// Ids in registration order.
    pub fn processor_ids(&self) -> &[ProcessorId] {
        &self.order
    }

    fn cell(&self, id: ProcessorId) -> FluxResult<&ProcessorCell> {
        self.processors
            .get(&id)
            .ok_or(FluxError::UnknownProcessor { id })
    }

    /// Wire `(from, out_port)` to `(to, in_port)` under the default policy
    /// that forbids rebinding an already-bound input port.
    pub fn connect(
        &mut self,
        from: ProcessorId,
        out_port: usize,
        to: ProcessorId,
        in_port: usize,
    ) -> FluxResult<()> {
        self.connect_with_policy(from, out_port, to, in_port, MergePolicy::Forbid)
    }

    /// Shorthand for wiring output port 0 to input port 0.
    pub fn connect_default(&mut self, from: ProcessorId, to: ProcessorId) -> FluxResult<()> {
        self.connect(from, 0, to, 0)
    }

    pub fn connect_with_policy(
        &mut self,
        from: ProcessorId,
        out_port: usize,
        to: ProcessorId,
        in_port: usize,
        policy: MergePolicy,
    ) -> FluxResult<()> {
        let out_arity = self
            .cell(from)?
            .lock()
            .expect("processor mutex poisoned")
            .output_arity();
        if out_port >= out_arity {
            return Err(FluxError::PortOutOfRange {
                id: from,
                port: out_port,
                arity: out_arity,
                direction: PortDirection::Output,
            });
        }
        let in_arity = self
            .cell(to)?
            .lock()
            .expect("processor mutex poisoned")
            .input_arity();
        if in_port >= in_arity {
            return Err(FluxError::PortOutOfRange {
                id: to,
                port: in_port,
                arity: in_arity,
                direction: PortDirection::Input,
            });
        }

        let consumer_key = (to, in_port);
        let existing = self.inbound.entry(consumer_key).or_default();
        if !existing.is_empty() {
            match policy {
                MergePolicy::Forbid => {
                    return Err(FluxError::connection(format!(
                        "input port {in_port} of {to} is already bound; \
                         use Replace or Append to merge"
                    )));
                }
                MergePolicy::Replace => {
                    for (producer, producer_port) in existing.drain(..) {
                        if let Some(consumers) = self.edges.get_mut(&(producer, producer_port)) {
                            consumers.retain(|c| *c != consumer_key);
                        }
                    }
                }
                MergePolicy::Append => {}
            }
        }

        self.inbound
            .entry(consumer_key)
            .or_default()
            .push((from, out_port));
        self.edges
            .entry((from, out_port))
            .or_default()
            .push(consumer_key);
        log::debug!("[graph] connect {from}:{out_port} -> {to}:{in_port} ({policy:?})");
        Ok(())
    }

    /// Attach (or with `None` detach) a provenance tracker, on the graph and
    /// on every current and future processor.
    pub fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        for id in &self.order {
            self.processors[id]
                .lock()
                .expect("processor mutex poisoned")
                .set_tracker(tracker.clone());
        }
        self.tracker = tracker;
    }

    /// Push one event into an input port of a registered processor and run
    /// the synchronous drain loop. An `Err` aborts only this push: the
    /// failing processor's state is untouched, deliveries that already
    /// happened stay.
    pub fn push(&mut self, target: ProcessorId, port: usize, value: Value) -> FluxResult<()> {
        {
            let cell = self.cell(target)?;
            let mut processor = cell.lock().expect("processor mutex poisoned");
            let index = processor.enqueue(port, value)?;
            log::trace!("[graph] push -> {target}:{port} (event {index})");
        }
        self.drain(target)
    }

    /// Push one event per input stream of `target` (a whole input front),
    /// then drain.
    pub fn push_front(&mut self, target: ProcessorId, values: Vec<Value>) -> FluxResult<()> {
        {
            let cell = self.cell(target)?;
            let mut processor = cell.lock().expect("processor mutex poisoned");
            if values.len() != processor.input_arity() {
                return Err(FluxError::arity_mismatch(
                    processor.name(),
                    processor.input_arity(),
                    values.len(),
                ));
            }
            for (port, value) in values.into_iter().enumerate() {
                processor.enqueue(port, value)?;
            }
        }
        self.drain(target)
    }

    fn drain(&mut self, start: ProcessorId) -> FluxResult<()> {
        let mut worklist = VecDeque::from([start]);
        while let Some(id) = worklist.pop_front() {
            loop {
                let step = {
                    let cell = self.cell(id)?;
                    let mut processor = cell.lock().expect("processor mutex poisoned");
                    if !processor.ready() {
                        Step::NotReady
                    } else {
                        match processor.compute()? {
                            None => Step::NoOutput,
                            // compute() claimed the index for this front, so
                            // it is the produced count minus one
                            Some(outputs) => {
                                let front_index = processor.produced().saturating_sub(1);
                                Step::Front(outputs, front_index)
                            }
                        }
                    }
                };
                match step {
                    Step::NotReady => break,
                    Step::NoOutput => continue,
                    Step::Front(outputs, front_index) => {
                        self.deliver(id, outputs, front_index, &mut worklist)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fan each output of one produced front out along the edge table.
    fn deliver(
        &self,
        producer: ProcessorId,
        outputs: Vec<Value>,
        front_index: u64,
        worklist: &mut VecDeque<ProcessorId>,
    ) -> FluxResult<()> {
        for (out_port, value) in outputs.into_iter().enumerate() {
            let Some(consumers) = self.edges.get(&(producer, out_port)) else {
                log::trace!(
                    "[graph] {producer}:{out_port} has no consumers, event {front_index} dropped"
                );
                continue;
            };
            for &(consumer, in_port) in consumers {
                let index = {
                    let cell = self.cell(consumer)?;
                    let mut processor = cell.lock().expect("processor mutex poisoned");
                    processor.enqueue(in_port, value.clone())?
                };
                if let Some(tracker) = &self.tracker {
                    // The consumer's input event IS the producer's output
                    // event; recording the identity links lineage across
                    // processor boundaries.
                    tracker
                        .lock()
                        .expect("tracker mutex poisoned")
                        .associate(
                            EventRef::input(consumer, in_port, index),
                            vec![ProvenanceNode::Event(EventRef::output(
                                producer,
                                out_port,
                                front_index,
                            ))],
                        );
                }
                worklist.push_back(consumer);
            }
        }
        Ok(())
    }

    /// Every processor reachable from `root` by following edges downstream,
    /// `root` included, in breadth-first order.
    pub fn downstream_of(&self, root: ProcessorId) -> FluxResult<Vec<ProcessorId>> {
        if !self.contains(root) {
            return Err(FluxError::UnknownProcessor { id: root });
        }
        let mut visited = vec![root];
        let mut frontier = VecDeque::from([root]);
        while let Some(id) = frontier.pop_front() {
            for (_, consumer, _) in self.edges_from(id) {
                if !visited.contains(&consumer) {
                    visited.push(consumer);
                    frontier.push_back(consumer);
                }
            }
        }
        Ok(visited)
    }

    /// Outgoing edges of one processor as `(out_port, consumer, in_port)`,
    /// ordered by output port.
    pub fn edges_from(&self, id: ProcessorId) -> Vec<(usize, ProcessorId, usize)> {
        let Some(cell) = self.processors.get(&id) else {
            return Vec::new();
        };
        let out_arity = cell.lock().expect("processor mutex poisoned").output_arity();
        let mut result = Vec::new();
        for out_port in 0..out_arity {
            if let Some(consumers) = self.edges.get(&(id, out_port)) {
                for &(consumer, in_port) in consumers {
                    result.push((out_port, consumer, in_port));
                }
            }
        }
        result
    }

    /// Incoming bindings of one processor as `(in_port, producer, out_port)`.
    pub fn edges_into(&self, id: ProcessorId) -> Vec<(usize, ProcessorId, usize)> {
        let Some(cell) = self.processors.get(&id) else {
            return Vec::new();
        };
        let in_arity = cell.lock().expect("processor mutex poisoned").input_arity();
        let mut result = Vec::new();
        for in_port in 0..in_arity {
            if let Some(producers) = self.inbound.get(&(id, in_port)) {
                for &(producer, out_port) in producers {
                    result.push((in_port, producer, out_port));
                }
            }
        }
        result
    }

    /// Instantiate an independent copy of the subgraph reachable from
    /// `roots`: fresh processors (fresh ids, fresh state, same
    /// configuration) and re-created internal edges. Returns the new graph
    /// and the old-id to new-id translation map.
    pub fn clone_subgraph(
        &self,
        roots: &[ProcessorId],
    ) -> FluxResult<(ProcessorGraph, HashMap<ProcessorId, ProcessorId>)> {
        let mut included = Vec::new();
        for &root in roots {
            for id in self.downstream_of(root)? {
                if !included.contains(&id) {
                    included.push(id);
                }
            }
        }

        let mut copy = ProcessorGraph::new();
        copy.tracker = self.tracker.clone();
        let mut translation = HashMap::new();
        // Registration order of the original keeps the copy deterministic
        for &id in self.order.iter().filter(|id| included.contains(id)) {
            let clone = self.processors[&id]
                .lock()
                .expect("processor mutex poisoned")
                .clone_processor();
            translation.insert(id, copy.add_boxed(clone));
        }
        for &id in self.order.iter().filter(|id| included.contains(id)) {
            for (out_port, consumer, in_port) in self.edges_from(id) {
                if let Some(&new_consumer) = translation.get(&consumer) {
                    // Append reproduces multi-bound ports faithfully
                    copy.connect_with_policy(
                        translation[&id],
                        out_port,
                        new_consumer,
                        in_port,
                        MergePolicy::Append,
                    )?;
                }
            }
        }
        Ok((copy, translation))
    }

    /// Reset every processor to its initial internal state. Wiring and
    /// identities are preserved.
    pub fn reset(&mut self) {
        for id in &self.order {
            self.processors[id]
                .lock()
                .expect("processor mutex poisoned")
                .reset();
        }
    }
}

impl std::fmt::Debug for ProcessorGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorGraph")
            .field("processors", &self.order.len())
            .field("edges", &self.edges.values().map(Vec::len).sum::<usize>())
            .field("tracked", &self.tracker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::{And, CumulativeFunction};
    use crate::core::processor::{CollectorSink, CumulativeProcessor, FunctionProcessor};

    fn sink(graph: &mut ProcessorGraph) -> (ProcessorId, Arc<Mutex<Vec<Value>>>) {
        let sink = CollectorSink::new();
        let received = sink.received();
        (graph.add(sink), received)
    }

    #[test]
    fn test_fan_out_delivers_identical_copies_in_order() {
        let mut graph = ProcessorGraph::new();
        let source = graph.add(FunctionProcessor::passthrough());
        let (a, received_a) = sink(&mut graph);
        let (b, received_b) = sink(&mut graph);
        graph.connect(source, 0, a, 0).unwrap();
        graph.connect(source, 0, b, 0).unwrap();

        for i in [10i64, 20, 30] {
            graph.push(source, 0, Value::Int(i)).unwrap();
        }
        let expected = vec![Value::Int(10), Value::Int(20), Value::Int(30)];
        assert_eq!(*received_a.lock().unwrap(), expected);
        assert_eq!(*received_b.lock().unwrap(), expected);
    }

    #[test]
    fn test_connect_rejects_unknown_processor() {
        let mut graph = ProcessorGraph::new();
        let source = graph.add(FunctionProcessor::passthrough());
        let ghost = ProcessorId::fresh();
        assert!(matches!(
            graph.connect(source, 0, ghost, 0),
            Err(FluxError::UnknownProcessor { .. })
        ));
    }

    #[test]
    fn test_connect_rejects_out_of_range_ports() {
        let mut graph = ProcessorGraph::new();
        let source = graph.add(FunctionProcessor::passthrough());
        let conjunction = graph.add(FunctionProcessor::new(And::instance()));
        assert!(matches!(
            graph.connect(source, 1, conjunction, 0),
            Err(FluxError::PortOutOfRange {
                direction: PortDirection::Output,
                ..
            })
        ));
        assert!(matches!(
            graph.connect(source, 0, conjunction, 2),
            Err(FluxError::PortOutOfRange {
                direction: PortDirection::Input,
                ..
            })
        ));
    }

    #[test]
    fn test_rebinding_an_input_port_requires_a_policy() {
        let mut graph = ProcessorGraph::new();
        let first = graph.add(FunctionProcessor::passthrough());
        let second = graph.add(FunctionProcessor::passthrough());
        let (target, received) = sink(&mut graph);

        graph.connect(first, 0, target, 0).unwrap();
        let err = graph.connect(second, 0, target, 0).unwrap_err();
        assert!(matches!(err, FluxError::Connection { .. }));

        // Last-wins rewiring: only the second producer remains bound
        graph
            .connect_with_policy(second, 0, target, 0, MergePolicy::Replace)
            .unwrap();
        graph.push(first, 0, Value::Int(1)).unwrap();
        graph.push(second, 0, Value::Int(2)).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![Value::Int(2)]);
    }

    #[test]
    fn test_append_policy_merges_streams() {
        let mut graph = ProcessorGraph::new();
        let first = graph.add(FunctionProcessor::passthrough());
        let second = graph.add(FunctionProcessor::passthrough());
        let (target, received) = sink(&mut graph);

        graph.connect(first, 0, target, 0).unwrap();
        graph
            .connect_with_policy(second, 0, target, 0, MergePolicy::Append)
            .unwrap();
        graph.push(first, 0, Value::Int(1)).unwrap();
        graph.push(second, 0, Value::Int(2)).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_failed_push_leaves_retry_possible() {
        let mut graph = ProcessorGraph::new();
        let conjunction = graph.add(CumulativeProcessor::new(
            CumulativeFunction::new(And::instance(), true).unwrap(),
        ));
        let (target, received) = sink(&mut graph);
        graph.connect(conjunction, 0, target, 0).unwrap();

        let err = graph.push(conjunction, 0, Value::Int(5)).unwrap_err();
        assert!(matches!(err, FluxError::TypeMismatch { .. }));
        assert!(received.lock().unwrap().is_empty());

        // The bad event is still queued; a reset clears it and the same
        // pipeline runs clean.
        graph.reset();
        graph.push(conjunction, 0, Value::Bool(true)).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![Value::Bool(true)]);
    }

    #[test]
    fn test_downstream_traversal() {
        let mut graph = ProcessorGraph::new();
        let source = graph.add(FunctionProcessor::passthrough());
        let middle = graph.add(FunctionProcessor::passthrough());
        let (leaf, _) = sink(&mut graph);
        let detached = graph.add(FunctionProcessor::passthrough());
        graph.connect(source, 0, middle, 0).unwrap();
        graph.connect(middle, 0, leaf, 0).unwrap();

        let reachable = graph.downstream_of(source).unwrap();
        assert_eq!(reachable, vec![source, middle, leaf]);
        assert!(!reachable.contains(&detached));
    }

    #[test]
    fn test_clone_subgraph_is_independent() {
        let mut graph = ProcessorGraph::new();
        let source = graph.add(FunctionProcessor::passthrough());
        let sum = graph.add(CumulativeProcessor::new(
            CumulativeFunction::new(crate::core::function::Addition::instance(), 0i64).unwrap(),
        ));
        graph.connect(source, 0, sum, 0).unwrap();
        graph.push(source, 0, Value::Int(5)).unwrap();

        let (mut copy, translation) = graph.clone_subgraph(&[source]).unwrap();
        assert_eq!(copy.len(), 2);
        let new_source = translation[&source];
        assert_ne!(new_source, source);

        // The copy starts from scratch: no inherited accumulator
        let (copy_sink, received) = sink(&mut copy);
        copy.connect(translation[&sum], 0, copy_sink, 0).unwrap();
        copy.push(new_source, 0, Value::Int(1)).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_push_front_checks_arity() {
        let mut graph = ProcessorGraph::new();
        let conjunction = graph.add(FunctionProcessor::new(And::instance()));
        let err = graph
            .push_front(conjunction, vec![Value::Bool(true)])
            .unwrap_err();
        assert!(matches!(err, FluxError::ArityMismatch { expected: 2, actual: 1, .. }));
    }
}
