// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scatter plot generation from bags of tuples.

use std::collections::BTreeSet;
use std::fmt;

use super::format_number;
use crate::core::error::{FluxError, FluxResult};
use crate::core::event::{Bag, Value};
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

/// Generates a gnuplot scatter plot from a bag of tuples.
///
/// One tuple field is the x axis; every other field becomes a series. Each
/// compute step emits a complete gnuplot file body with inline CSV data
/// blocks, one per series, rows ordered by x.
pub struct ScatterPlotter {
    meta: ProcessorMeta,
    title: String,
    x_column: String,
}

impl ScatterPlotter {
    pub fn new(x_column: impl Into<String>) -> Self {
        Self {
            meta: ProcessorMeta::new("ScatterPlotter", 1),
            title: "Scatter plot".to_string(),
            x_column: x_column.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn render(&self, bag: &Bag) -> String {
        // Series set is the union of non-x fields over every tuple
        let mut series: BTreeSet<String> = BTreeSet::new();
        for (element, _) in bag.iter() {
            if let Some(tuple) = element.as_tuple() {
                for key in tuple.keys() {
                    if key != self.x_column {
                        series.insert(key.to_string());
                    }
                }
            }
        }

        let mut out = String::new();
        out.push_str(&format!("set title \"{}\"\n", self.title));
        out.push_str("set datafile separator \",\"\n");
        let clauses: Vec<String> = series
            .iter()
            .map(|name| format!("'-' using 1:2 title \"{name}\" with points"))
            .collect();
        out.push_str(&format!("plot {}\n", clauses.join(", ")));

        for name in &series {
            let mut rows: Vec<(f64, String)> = Vec::new();
            for (element, _) in bag.iter() {
                let Some(tuple) = element.as_tuple() else {
                    continue;
                };
                let (Some(x), Some(y)) = (tuple.get(&self.x_column), tuple.get(name)) else {
                    continue;
                };
                if let Some(x_key) = x.as_f64() {
                    rows.push((x_key, format!("{},{}\n", format_number(x), format_number(y))));
                }
            }
            rows.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (_, row) in rows {
                out.push_str(&row);
            }
            out.push_str("e\n");
        }
        out
    }
}

impl Processor for ScatterPlotter {
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
        let Some(bag) = inputs[0].as_bag() else {
            return Err(FluxError::type_mismatch(
                self.meta.name(),
                "bag",
                inputs[0].type_name(),
            ));
        };
        let rendered = self.render(bag);
        self.meta.pop_front();
        let step = self.meta.next_output_index();
        if self.meta.has_tracker() {
            self.meta.associate_output(
                0,
                step,
                vec![ProvenanceNode::Event(EventRef::input(
                    self.meta.id(),
                    0,
                    self.meta.current_input_index(0),
                ))],
            );
        }
        Ok(Some(vec![Value::Str(rendered)]))
    }

    fn reset(&mut self) {
        self.meta.reset();
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(Self::new(self.x_column.clone()).with_title(self.title.clone()))
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for ScatterPlotter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScatterPlotter")
            .field("meta", &self.meta)
            .field("title", &self.title)
            .field("x_column", &self.x_column)
            .finish()
    }
}
