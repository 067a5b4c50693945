//! Reference slots: the places inside a resource that point at another one
//!
//! A slot is any JSON object member named `reference` holding a string, at
//! any depth of the resource body.

use crate::model::Resource;
use serde_json::Value;

/// Mutable handle on one reference value
#[derive(Debug)]
pub struct ReferenceSlot<'a> {
    value: &'a mut String,
}

impl ReferenceSlot<'_> {
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        *self.value = value.into();
    }
}

/// Capability of exposing reference slots for rewriting
pub trait ReferenceSlots {
    fn reference_slots(&mut self) -> Vec<ReferenceSlot<'_>>;
}

impl ReferenceSlots for Resource {
    fn reference_slots(&mut self) -> Vec<ReferenceSlot<'_>> {
        let mut slots = Vec::new();
        for value in self.payload.values_mut() {
            collect_slots(value, &mut slots);
        }
        slots
    }
}

impl ReferenceSlots for Value {
    fn reference_slots(&mut self) -> Vec<ReferenceSlot<'_>> {
        let mut slots = Vec::new();
        collect_slots(self, &mut slots);
        slots
    }
}

fn collect_slots<'a>(value: &'a mut Value, out: &mut Vec<ReferenceSlot<'a>>) {
    match value {
        Value::Object(members) => {
            for (key, member) in members.iter_mut() {
                match (key.as_str(), member) {
                    ("reference", Value::String(s)) => out.push(ReferenceSlot { value: s }),
                    (_, other) => collect_slots(other, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                collect_slots(item, out);
            }
        }
        _ => {}
    }
}
