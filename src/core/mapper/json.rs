// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON to event mapping.
//!
//! Maps one JSON object per line to one event tuple. Top-level fields are
//! auto-mapped in sorted key order, so the same schema always yields the
//! same stream positions regardless of how a producer ordered its keys.

use crate::core::error::{FluxError, FluxResult};
use crate::core::event::Value;

/// Maps newline-delimited JSON objects to event fronts.
#[derive(Debug, Clone, Default)]
pub struct JsonEventMapper {
    /// Skip unparseable lines instead of failing the whole batch.
    ignore_parse_errors: bool,
}

impl JsonEventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_parse_errors(mut self, ignore: bool) -> Self {
        self.ignore_parse_errors = ignore;
        self
    }

    /// Map one JSON object to an event front, fields in sorted key order.
    pub fn map_line(&self, line: &str) -> FluxResult<Vec<Value>> {
        let json: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            FluxError::mapping_failed_with_source("line is not valid JSON", Box::new(e))
        })?;
        let serde_json::Value::Object(fields) = json else {
            return Err(FluxError::mapping_failed(format!(
                "JSON root must be an object for auto-mapping, got {}",
                json_kind(&json)
            )));
        };
        let mut sorted_keys: Vec<_> = fields.keys().cloned().collect();
        sorted_keys.sort();
        Ok(sorted_keys
            .into_iter()
            .filter_map(|key| fields.get(&key).cloned())
            .map(Value::from)
            .collect())
    }

    /// Map a newline-delimited batch. Blank lines are skipped; bad lines
    /// are skipped with a warning when `ignore_parse_errors` is set.
    pub fn map_lines(&self, text: &str) -> FluxResult<Vec<Vec<Value>>> {
        let mut events = Vec::new();
        for (line_number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match self.map_line(line) {
                Ok(event) => events.push(event),
                Err(e) if self.ignore_parse_errors => {
                    log::warn!("skipping unmappable line {}: {e}", line_number + 1);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(events)
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_map_sorts_keys() {
        let mapper = JsonEventMapper::new();
        let event = mapper.map_line(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(event, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let mapper = JsonEventMapper::new();
        let err = mapper.map_line("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn test_batch_mapping_skips_blank_lines() {
        let mapper = JsonEventMapper::new();
        let events = mapper
            .map_lines("{\"x\": true}\n\n{\"x\": false}\n")
            .unwrap();
        assert_eq!(
            events,
            vec![vec![Value::Bool(true)], vec![Value::Bool(false)]]
        );
    }

    #[test]
    fn test_ignore_parse_errors_drops_bad_lines() {
        let mapper = JsonEventMapper::new().with_ignore_parse_errors(true);
        let events = mapper.map_lines("not json\n{\"x\": 3}\n").unwrap();
        assert_eq!(events, vec![vec![Value::Int(3)]]);

        let strict = JsonEventMapper::new();
        assert!(strict.map_lines("not json\n{\"x\": 3}\n").is_err());
    }
}
