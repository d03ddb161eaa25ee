// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed graph construction.
//!
//! A parser (or any other front end) describes a pipeline as a sequence of
//! construction commands over handles; the builder turns them into a wired
//! [`ProcessorGraph`]. The builder never sees surface syntax or raw tokens,
//! only already-built processors and wiring directives.

use std::collections::HashMap;

use super::{MergePolicy, ProcessorGraph};
use crate::core::error::{FluxError, FluxResult};
use crate::core::event::Value;
use crate::core::function::{CumulativeFunction, Function, SharedFunction};
use crate::core::processor::{CumulativeProcessor, Processor, ProcessorId};

/// Opaque reference to a processor pushed into a builder: its position in
/// push order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub usize);

/// One typed construction command.
pub enum BuildCommand {
    /// Register a processor; yields the next handle.
    Push(Box<dyn Processor>),
    /// Turn a binary function and a seed into a cumulative processor;
    /// yields the next handle.
    WrapCumulative {
        function: SharedFunction,
        seed: Value,
    },
    /// Wire two previously pushed processors.
    Connect {
        producer: Handle,
        producer_port: usize,
        consumer: Handle,
        consumer_port: usize,
    },
}

impl std::fmt::Debug for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildCommand::Push(p) => f.debug_tuple("Push").field(&p.name()).finish(),
            BuildCommand::WrapCumulative { function, seed } => f
                .debug_struct("WrapCumulative")
                .field("function", &function.name())
                .field("seed", seed)
                .finish(),
            BuildCommand::Connect {
                producer,
                producer_port,
                consumer,
                consumer_port,
            } => f
                .debug_struct("Connect")
                .field("producer", producer)
                .field("producer_port", producer_port)
                .field("consumer", consumer)
                .field("consumer_port", consumer_port)
                .finish(),
        }
    }
}

/// Incrementally assembles a [`ProcessorGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ProcessorGraph,
    handles: Vec<ProcessorId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor and return its handle.
    pub fn push(&mut self, processor: Box<dyn Processor>) -> Handle {
        let id = self.graph.add_boxed(processor);
        self.handles.push(id);
        Handle(self.handles.len() - 1)
    }

    /// Build a cumulative processor out of any binary function and a seed.
    pub fn wrap_cumulative(
        &mut self,
        function: SharedFunction,
        seed: impl Into<Value>,
    ) -> FluxResult<Handle> {
        let fold = CumulativeFunction::new(function, seed)?;
        Ok(self.push(Box::new(CumulativeProcessor::new(fold))))
    }

    pub fn connect(
        &mut self,
        producer: Handle,
        producer_port: usize,
        consumer: Handle,
        consumer_port: usize,
    ) -> FluxResult<()> {
        let from = self.id_of(producer)?;
        let to = self.id_of(consumer)?;
        self.graph.connect(from, producer_port, to, consumer_port)
    }

    pub fn connect_with_policy(
        &mut self,
        producer: Handle,
        producer_port: usize,
        consumer: Handle,
        consumer_port: usize,
        policy: MergePolicy,
    ) -> FluxResult<()> {
        let from = self.id_of(producer)?;
        let to = self.id_of(consumer)?;
        self.graph
            .connect_with_policy(from, producer_port, to, consumer_port, policy)
    }

    /// Resolve a handle to the underlying processor id.
    pub fn id_of(&self, handle: Handle) -> FluxResult<ProcessorId> {
        self.handles.get(handle.0).copied().ok_or_else(|| {
            FluxError::connection(format!(
                "handle {} does not name a pushed processor (have {})",
                handle.0,
                self.handles.len()
            ))
        })
    }

    /// Consume one command. `Push`/`WrapCumulative` yield the new handle.
    pub fn apply(&mut self, command: BuildCommand) -> FluxResult<Option<Handle>> {
        match command {
            BuildCommand::Push(processor) => Ok(Some(self.push(processor))),
            BuildCommand::WrapCumulative { function, seed } => {
                self.wrap_cumulative(function, seed).map(Some)
            }
            BuildCommand::Connect {
                producer,
                producer_port,
                consumer,
                consumer_port,
            } => {
                self.connect(producer, producer_port, consumer, consumer_port)?;
                Ok(None)
            }
        }
    }

    /// Run a full command sequence and return the finished graph.
    pub fn build_from(commands: Vec<BuildCommand>) -> FluxResult<ProcessorGraph> {
        let mut builder = GraphBuilder::new();
        for command in commands {
            builder.apply(command)?;
        }
        Ok(builder.into_graph())
    }

    /// Translation from handles to ids, for drivers that keep pushing after
    /// the build.
    pub fn handle_map(&self) -> HashMap<Handle, ProcessorId> {
        self.handles
            .iter()
            .enumerate()
            .map(|(i, id)| (Handle(i), *id))
            .collect()
    }

    pub fn into_graph(self) -> ProcessorGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use crate::core::function::Addition;
    use crate::core::processor::{CollectorSink, FunctionProcessor};

    #[test]
    fn test_command_sequence_builds_running_sum() {
        let mut builder = GraphBuilder::new();
        let source = builder
            .apply(BuildCommand::Push(Box::new(FunctionProcessor::passthrough())))
            .unwrap()
            .unwrap();
        let sum = builder
            .apply(BuildCommand::WrapCumulative {
                function: Addition::instance(),
                seed: Value::Int(0),
            })
            .unwrap()
            .unwrap();
        let sink_processor = CollectorSink::new();
        let received = sink_processor.received();
        let sink = builder
            .apply(BuildCommand::Push(Box::new(sink_processor)))
            .unwrap()
            .unwrap();
        builder
            .apply(BuildCommand::Connect {
                producer: source,
                producer_port: 0,
                consumer: sum,
                consumer_port: 0,
            })
            .unwrap();
        builder
            .apply(BuildCommand::Connect {
                producer: sum,
                producer_port: 0,
                consumer: sink,
                consumer_port: 0,
            })
            .unwrap();

        let source_id = builder.id_of(source).unwrap();
        let mut graph = builder.into_graph();
        for i in [1i64, 2, 3] {
            graph.push(source_id, 0, Value::Int(i)).unwrap();
        }
        assert_eq!(
            *received.lock().unwrap(),
            vec![Value::Int(1), Value::Int(3), Value::Int(6)]
        );
    }

    #[test]
    fn test_dangling_handle_is_a_connection_error() {
        let mut builder = GraphBuilder::new();
        let only = builder.push(Box::new(FunctionProcessor::passthrough()));
        let err = builder.connect(only, 0, Handle(7), 0).unwrap_err();
        assert!(matches!(err, crate::core::error::FluxError::Connection { .. }));
    }
}
