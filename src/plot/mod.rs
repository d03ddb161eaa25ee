// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gnuplot renderers.
//!
//! Renderers are ordinary 1-in/1-out processors: they consume bag events
//! and emit the text of a gnuplot file regenerated from the most recently
//! received bag. They use nothing from the core beyond the processor
//! contract.

pub mod heatmap;
pub mod scatterplot;

pub use heatmap::HeatMapPlotter;
pub use scatterplot::ScatterPlotter;

use crate::core::event::Value;

/// Renders a numeric value the way gnuplot data rows expect it.
fn format_number(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        other => format!("{other:?}"),
    }
}
