//! JSON argument values -> operation arguments.
//!
//! - `"x"`, `1`, `true`        => scalar
//! - `[1280, 720]`             => positional list
//! - `{"w": 100, "f": {"file": "a.txt"}}` => keyed map (file values become `f=/a.txt`)

use crate::args::{Arg, Value};
use crate::error::GraphError;
use crate::Result;
use serde_json::Value as Json;

pub fn to_arg(v: &Json) -> Result<Arg> {
    match v {
        Json::Array(items) => Ok(Arg::List(
            items.iter().map(scalar).collect::<Result<Vec<_>>>()?,
        )),
        Json::Object(map) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (key, value) in map {
                let value = match value {
                    Json::Object(inner) => match (inner.len(), inner.get("file")) {
                        (1, Some(path)) => Value::File(scalar(path)?),
                        _ => {
                            return Err(GraphError::Script(format!(
                                "argument {} must be a scalar or {{\"file\": path}}",
                                key
                            )));
                        }
                    },
                    other => Value::Text(scalar(other)?),
                };
                pairs.push((key.clone(), value));
            }
            Ok(Arg::Map(pairs))
        }
        other => Ok(Arg::Scalar(scalar(other)?)),
    }
}

pub fn to_args(values: &[Json]) -> Result<Vec<Arg>> {
    values.iter().map(to_arg).collect()
}

/// Scalar JSON as the text ffmpeg expects (strings without quotes).
pub fn scalar(v: &Json) -> Result<String> {
    match v {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => Err(GraphError::Script(format!(
            "expected a string, number or bool, got {}",
            other
        ))),
    }
}
