// SPDX-License-Identifier: MIT OR Apache-2.0

//! The implication operator.

use crate::core::error::FluxResult;
use crate::core::function::Implication;
use crate::core::graph::ProcessorGraph;
use crate::core::processor::{FunctionProcessor, ProcessorId};

/// Wires two independently-built sub-processors into a logical implication:
/// `left` feeds the antecedent port, `right` the consequent port. Returns
/// the id of the implication node, whose single output emits one boolean
/// per event pair.
pub fn implies(
    graph: &mut ProcessorGraph,
    left: ProcessorId,
    right: ProcessorId,
) -> FluxResult<ProcessorId> {
    let op = graph.add(FunctionProcessor::new(Implication::instance()));
    graph.connect(left, 0, op, 0)?;
    graph.connect(right, 0, op, 1)?;
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use crate::core::processor::{CollectorSink, FunctionProcessor};

    #[test]
    fn test_implication_over_paired_streams() {
        let mut graph = ProcessorGraph::new();
        let antecedent = graph.add(FunctionProcessor::passthrough());
        let consequent = graph.add(FunctionProcessor::passthrough());
        let op = implies(&mut graph, antecedent, consequent).unwrap();

        let sink = CollectorSink::new();
        let received = sink.received();
        let sink_id = graph.add(sink);
        graph.connect_default(op, sink_id).unwrap();

        for (a, c) in [(true, true), (true, false), (false, false)] {
            graph.push(antecedent, 0, Value::Bool(a)).unwrap();
            graph.push(consequent, 0, Value::Bool(c)).unwrap();
        }
        assert_eq!(
            *received.lock().unwrap(),
            vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)]
        );
    }
}
