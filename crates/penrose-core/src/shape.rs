//! The post-evaluation shape record (spec §3 "Shape").

use crate::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fully evaluated graphical primitive, ready for the renderer.
///
/// A synthetic `"name"` property equal to `"object.field"` is always present
/// (spec §3, §4.3).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub shape_type: String,
    pub properties: indexmap::IndexMap<String, Value>,
}

impl Shape {
    pub fn new(shape_type: impl Into<String>) -> Self {
        Self {
            shape_type: shape_type.into(),
            properties: indexmap::IndexMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.properties.get("name") {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }
}
