//! Path addressing over a nested JSON document.
//!
//! A path is a `.`-separated list of segments. Each segment is a field name,
//! optionally followed by one list index: `workExperience[0].jobTitle`.
//! Writes create whatever objects and list slots are missing on the way down.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::RegistryError;

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\[(\d+)\])?$").expect("segment pattern is valid"));

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `name`: descend into an object field.
    Field(String),
    /// `name[index]`: descend into an element of a list field.
    Indexed { name: String, index: usize },
}

/// A parsed, validated document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidPath {
            path: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("path is empty".to_string()));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let caps = SEGMENT
                .captures(part)
                .ok_or_else(|| invalid(format!("malformed segment '{part}'")))?;
            let name = caps[1].to_string();
            let segment = match caps.get(2) {
                Some(idx) => {
                    let index = idx
                        .as_str()
                        .parse()
                        .map_err(|e| invalid(format!("bad index in '{part}': {e}")))?;
                    Segment::Indexed { name, index }
                }
                None => Segment::Field(name),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for FieldPath {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Write `value` at `path`, creating intermediate objects and list slots.
///
/// Lists only ever grow (padded with empty objects up to the index); existing
/// elements are never removed or reordered. A non-container value sitting
/// where a container is needed is replaced by an empty one.
pub fn write(document: &mut Value, path: &FieldPath, value: Value) {
    let Some((last, parents)) = path.segments.split_last() else {
        return;
    };

    let mut node = document;
    for segment in parents {
        node = match segment {
            Segment::Field(name) => ensure_object(node)
                .entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            Segment::Indexed { name, index } => list_slot(node, name, *index),
        };
    }

    match last {
        Segment::Field(name) => {
            ensure_object(node).insert(name.clone(), value);
        }
        Segment::Indexed { name, index } => {
            *list_slot(node, name, *index) = value;
        }
    }
}

/// Ensure `node[name]` is a list of at least `index + 1` elements and return
/// the element at `index`.
fn list_slot<'a>(node: &'a mut Value, name: &str, index: usize) -> &'a mut Value {
    let slot = ensure_object(node)
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let list = ensure_array(slot);
    while list.len() <= index {
        list.push(Value::Object(Map::new()));
    }
    &mut list[index]
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn ensure_array(node: &mut Value) -> &mut Vec<Value> {
    if !node.is_array() {
        *node = Value::Array(Vec::new());
    }
    match node {
        Value::Array(list) => list,
        _ => unreachable!("node was just replaced with an array"),
    }
}
