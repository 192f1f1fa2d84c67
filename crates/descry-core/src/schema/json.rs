//! JSON rendering of the schema tree.
//!
//! The shape follows the reflection JSON that protobuf tooling commonly
//! consumes: every container keeps its children under `nested`, keyed by
//! name, and empty collections are left out entirely.

use super::{Enum, Field, FieldNode, MapField, Method, Namespace, Nested, Reserved, Service, Type};
use crate::descriptor::Label;
use serde_json::{json, Map, Value};

impl Namespace {
    /// Renders the tree as a JSON object. Key order follows insertion order.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        insert_nested(&mut object, &self.nested);
        Value::Object(object)
    }
}

fn insert_nested(object: &mut Map<String, Value>, children: &[Nested]) {
    if children.is_empty() {
        return;
    }
    let nested: Map<String, Value> = children
        .iter()
        .map(|child| (child.name().to_string(), child.to_json()))
        .collect();
    object.insert("nested".to_string(), Value::Object(nested));
}

fn reserved_json(reserved: &[Reserved]) -> Value {
    reserved
        .iter()
        .map(|r| match r {
            Reserved::Name(name) => json!(name),
            Reserved::Range(start, end) => json!([start, end]),
        })
        .collect()
}

impl Nested {
    /// Renders one child node
    pub fn to_json(&self) -> Value {
        match self {
            Nested::Namespace(ns) => ns.to_json(),
            Nested::Type(ty) => ty.to_json(),
            Nested::Enum(en) => en.to_json(),
            Nested::Service(svc) => svc.to_json(),
        }
    }
}

impl Type {
    /// Renders the type with its options, oneofs, fields, reserved list
    /// and nested children
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();

        if !self.options.is_empty() {
            let options: Map<String, Value> = self
                .options
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Bool(v)))
                .collect();
            object.insert("options".to_string(), Value::Object(options));
        }

        if !self.oneofs.is_empty() {
            let oneofs: Map<String, Value> = self
                .oneofs
                .iter()
                .map(|o| (o.name.clone(), json!({ "oneof": o.fields })))
                .collect();
            object.insert("oneofs".to_string(), Value::Object(oneofs));
        }

        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name().to_string(), f.to_json()))
            .collect();
        object.insert("fields".to_string(), Value::Object(fields));

        if !self.reserved.is_empty() {
            object.insert("reserved".to_string(), reserved_json(&self.reserved));
        }

        insert_nested(&mut object, &self.nested);
        Value::Object(object)
    }
}

impl FieldNode {
    /// Renders a plain or map field
    pub fn to_json(&self) -> Value {
        match self {
            FieldNode::Field(f) => f.to_json(),
            FieldNode::Map(m) => m.to_json(),
        }
    }
}

impl Field {
    /// `rule` is omitted for optional and unlabeled fields
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        match self.label {
            Some(label @ (Label::Required | Label::Repeated)) => {
                object.insert("rule".to_string(), json!(label.as_str()));
            }
            _ => {}
        }
        object.insert("type".to_string(), json!(self.type_name));
        object.insert("id".to_string(), json!(self.id));
        Value::Object(object)
    }
}

impl MapField {
    /// Renders `keyType`, `type` and `id`
    pub fn to_json(&self) -> Value {
        json!({
            "keyType": self.key_type,
            "type": self.value_type,
            "id": self.id,
        })
    }
}

impl Enum {
    /// Renders the values, plus reserved entries when present
    pub fn to_json(&self) -> Value {
        let values: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, number)| (name.clone(), json!(number)))
            .collect();
        let mut object = Map::new();
        object.insert("values".to_string(), Value::Object(values));
        if !self.reserved.is_empty() {
            object.insert("reserved".to_string(), reserved_json(&self.reserved));
        }
        Value::Object(object)
    }
}

impl Service {
    /// Renders the methods keyed by name
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if !self.methods.is_empty() {
            let methods: Map<String, Value> = self
                .methods
                .iter()
                .map(|m| (m.name.clone(), m.to_json()))
                .collect();
            object.insert("methods".to_string(), Value::Object(methods));
        }
        Value::Object(object)
    }
}

impl Method {
    /// Stream flags are emitted only when set
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("requestType".to_string(), json!(self.request_type));
        if self.request_stream {
            object.insert("requestStream".to_string(), Value::Bool(true));
        }
        object.insert("responseType".to_string(), json!(self.response_type));
        if self.response_stream {
            object.insert("responseStream".to_string(), Value::Bool(true));
        }
        Value::Object(object)
    }
}
