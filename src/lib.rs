// SPDX-License-Identifier: MIT OR Apache-2.0

//! # lineflux
//!
//! Composable event-stream processing with data lineage tracking.
//!
//! A pipeline is a directed graph of stateful **processors** exchanging
//! immutable **values**. An external driver pushes events into the graph;
//! each processor buffers per-stream input queues and runs a compute step
//! once every queue holds a pending event, synchronously forwarding its
//! outputs downstream. An optional **tracker** records which output events
//! causally depend on which input events, forming a lineage DAG.
//!
//! ```
//! use lineflux::{
//!     CollectorSink, CumulativeFunction, CumulativeProcessor, FunctionProcessor,
//!     And, ProcessorGraph, Value,
//! };
//!
//! // Running conjunction over a boolean stream
//! let mut graph = ProcessorGraph::new();
//! let source = graph.add(FunctionProcessor::passthrough());
//! let all_ok = graph.add(CumulativeProcessor::new(
//!     CumulativeFunction::new(And::instance(), true).unwrap(),
//! ));
//! let sink = CollectorSink::new();
//! let received = sink.received();
//! let sink = graph.add(sink);
//! graph.connect_default(source, all_ok).unwrap();
//! graph.connect_default(all_ok, sink).unwrap();
//!
//! for ok in [true, true, false, true] {
//!     graph.push(source, 0, Value::Bool(ok)).unwrap();
//! }
//! let outputs: Vec<_> = received.lock().unwrap().clone();
//! assert_eq!(
//!     outputs,
//!     [true, true, false, false].map(Value::Bool).to_vec()
//! );
//! ```

pub mod core;
pub mod ltl;
pub mod plot;

pub use crate::core::error::{FluxError, FluxResult, PortDirection};
pub use crate::core::event::{Bag, NamedTuple, Value};
pub use crate::core::function::{
    Addition, And, ArgumentPlaceholder, Constant, CumulativeFunction, Function, Implication,
    Multiplication, Not, Or, SharedFunction,
};
pub use crate::core::graph::{BuildCommand, GraphBuilder, Handle, MergePolicy, ProcessorGraph};
pub use crate::core::mapper::JsonEventMapper;
pub use crate::core::processor::{
    CollectorSink, CumulativeProcessor, FunctionProcessor, Processor, ProcessorId, ProcessorMeta,
};
pub use crate::core::provenance::{
    EventRef, EventTracker, LineageTracker, ProvenanceNode, SharedTracker,
};
pub use crate::ltl::{implies, UntilProcessor};
pub use crate::plot::{HeatMapPlotter, ScatterPlotter};
