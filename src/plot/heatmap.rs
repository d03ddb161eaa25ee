// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heat map generation from 2D bags.

use std::fmt;

use crate::core::error::{FluxError, FluxResult};
use crate::core::event::{Bag, Value};
use crate::core::processor::{Processor, ProcessorId, ProcessorMeta};
use crate::core::provenance::{EventRef, ProvenanceNode, SharedTracker};

/// Generates a gnuplot heat map from a bag of `(x, y)` tuples.
///
/// Bag elements are tuples with integer `x` and `y` fields; an element's
/// multiplicity is the cell weight, divided by the configured scale factor.
/// The bag does not need to cover the declared rectangle: missing cells are
/// zero. Each compute step emits a complete gnuplot file body built from
/// the last received bag.
pub struct HeatMapPlotter {
    meta: ProcessorMeta,
    title: String,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
    scale: u64,
    last_map: Option<Bag>,
}

impl HeatMapPlotter {
    /// The heat map is drawn in the rectangle `(min_x, min_y)`-`(max_x, max_y)`.
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            meta: ProcessorMeta::new("HeatMapPlotter", 1),
            title: "Heat map".to_string(),
            min_x,
            min_y,
            max_x,
            max_y,
            scale: 1,
            last_map: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// All cell weights are divided by this factor.
    pub fn with_scale(mut self, scale: u64) -> Self {
        self.scale = scale.max(1);
        self
    }

    fn render(&self, map: &Bag) -> String {
        let width = (self.max_x - self.min_x).max(0) as usize;
        let height = (self.max_y - self.min_y).max(0) as usize;
        let mut cells = vec![0u64; width * height];
        for (element, count) in map.iter() {
            let Some(tuple) = element.as_tuple() else {
                continue;
            };
            let (Some(x), Some(y)) = (
                tuple.get("x").and_then(Value::as_i64),
                tuple.get("y").and_then(Value::as_i64),
            ) else {
                continue;
            };
            if x < self.min_x || x >= self.max_x || y < self.min_y || y >= self.max_y {
                log::debug!(
                    "[{}] point ({x}, {y}) outside declared rectangle, skipped",
                    self.meta.id()
                );
                continue;
            }
            let column = (x - self.min_x) as usize;
            let row = (y - self.min_y) as usize;
            cells[column * height + row] = count / self.scale;
        }

        let mut out = String::new();
        out.push_str(&format!("set title \"{}\"\n", self.title));
        out.push_str(&format!(
            "set xrange [{}:{}]\n",
            self.min_x as f64 - 0.5,
            self.max_x as f64 + 0.5
        ));
        out.push_str(&format!(
            "set yrange [{}:{}]\n",
            self.min_y as f64 - 0.5,
            self.max_y as f64 + 0.5
        ));
        out.push_str("set view map\n");
        out.push_str("splot '-' matrix with image\n");
        for column in 0..width {
            for row in 0..height {
                out.push_str(&cells[column * height + row].to_string());
                out.push(' ');
            }
            out.push('\n');
        }
        out.push_str("e\ne\n");
        out
    }
}

impl Processor for HeatMapPlotter {
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
        let Some(map) = inputs[0].as_bag() else {
            return Err(FluxError::type_mismatch(
                self.meta.name(),
                "bag",
                inputs[0].type_name(),
            ));
        };
        self.last_map = Some(map.clone());
        self.meta.pop_front();
        // The output is always generated from the most recently received map
        let rendered = match &self.last_map {
            Some(map) => self.render(map),
            None => return Ok(None),
        };
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
        self.last_map = None;
    }

    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(
            Self::new(self.min_x, self.min_y, self.max_x, self.max_y)
                .with_title(self.title.clone())
                .with_scale(self.scale),
        )
    }

    fn set_tracker(&mut self, tracker: Option<SharedTracker>) {
        self.meta.set_tracker(tracker);
    }
}

impl fmt::Debug for HeatMapPlotter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatMapPlotter")
            .field("meta", &self.meta)
            .field("title", &self.title)
            .field("rectangle", &(self.min_x, self.min_y, self.max_x, self.max_y))
            .field("scale", &self.scale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::NamedTuple;

    fn point(x: i64, y: i64) -> Value {
        Value::Tuple(NamedTuple::new().with("x", x).with("y", y))
    }

    fn drive(plotter: &mut HeatMapPlotter, map: Bag) -> String {
        plotter.enqueue(0, Value::Bag(map)).unwrap();
        let out = plotter.compute().unwrap().unwrap();
        out[0].as_str().unwrap().to_string()
    }

    #[test]
    fn test_header_and_matrix_layout() {
        let mut plotter = HeatMapPlotter::new(0, 0, 2, 2).with_title("occupancy");
        let mut map = Bag::new();
        map.insert_n(point(0, 0), 3);
        map.insert(point(1, 1));
        let text = drive(&mut plotter, map);

        assert!(text.starts_with("set title \"occupancy\"\n"));
        assert!(text.contains("set xrange [-0.5:2.5]\n"));
        assert!(text.contains("set view map\nsplot '-' matrix with image\n"));
        assert!(text.ends_with("e\ne\n"));
        // Row for x=0: cell (0,0)=3, (0,1)=0; row for x=1: (1,0)=0, (1,1)=1
        assert!(text.contains("3 0 \n0 1 \n"));
    }

    #[test]
    fn test_missing_cells_are_zero_and_scale_divides() {
        let mut plotter = HeatMapPlotter::new(0, 0, 1, 2).with_scale(2);
        let mut map = Bag::new();
        map.insert_n(point(0, 1), 5);
        let text = drive(&mut plotter, map);
        // 5 / 2 = 2 with integer division, the (0,0) cell was never set
        assert!(text.contains("0 2 \n"));
    }

    #[test]
    fn test_points_outside_rectangle_are_skipped() {
        let mut plotter = HeatMapPlotter::new(0, 0, 1, 1);
        let mut map = Bag::new();
        map.insert(point(5, 5));
        let text = drive(&mut plotter, map);
        assert!(text.contains("0 \n"));
    }

    #[test]
    fn test_non_bag_input_is_a_type_mismatch() {
        let mut plotter = HeatMapPlotter::new(0, 0, 1, 1);
        plotter.enqueue(0, Value::Int(3)).unwrap();
        assert!(plotter.compute().is_err());
        assert!(plotter.ready(), "rejected event stays queued");
    }
}
