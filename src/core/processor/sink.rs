// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal capture sink.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::core::error::FluxResult;
use crate::core::event::Value;
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::SharedTracker;

/// 1-in/0-out sink that logs and retains every value it receives.
///
/// The buffer is behind a shared handle so callers can keep reading it
/// after the sink has been moved into a graph.
pub struct CollectorSink {
    meta: ProcessorMeta,
    received: Arc<Mutex<Vec<Value>>>,
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            meta: ProcessorMeta::new("CollectorSink", 1),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the received-values buffer.
    pub fn received(&self) -> Arc<Mutex<Vec<Value>>> {
        Arc::clone(&self.received)
    }
}

impl Processor for CollectorSink {
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
        0
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
        let Some(mut inputs) = self.meta.peek_front() else {
            return Ok(None);
        };
        self.meta.pop_front();
        let value = inputs.remove(0);
        log::debug!("[{}] received {:?}", self.meta.id(), value);
        self.received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(value);
        Ok(None)
    }

    fn reset(&mut self) {
        self.meta.reset();
        self.received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(Self::new())
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for CollectorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorSink")
            .field("meta", &self.meta)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_arrival_order() {
        let mut sink = CollectorSink::new();
        let received = sink.received();
        for i in 0..3i64 {
            sink.enqueue(0, Value::Int(i)).unwrap();
            assert!(sink.compute().unwrap().is_none());
        }
        assert_eq!(
            *received.lock().unwrap(),
            vec![Value::Int(0), Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_reset_clears_buffer() {
        let mut sink = CollectorSink::new();
        sink.enqueue(0, Value::Int(1)).unwrap();
        sink.compute().unwrap();
        sink.reset();
        assert!(sink.received().lock().unwrap().is_empty());
    }
}
