//! Schema-optional access to third-party JSON.
//!
//! Every step asks the current node whether it exposes the requested key or
//! index; a missing or differently shaped node turns into an empty node rather
//! than an error, so a whole chain collapses to "no data" at the first mismatch.

use serde_json::Value;

/// A possibly-missing position inside a JSON document
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(Option<&'a Value>);

impl<'a> Node<'a> {
    pub fn new(value: &'a Value) -> Self {
        Node(Some(value))
    }

    pub fn missing() -> Self {
        Node(None)
    }

    /// Child under an object key
    pub fn key(self, name: &str) -> Node<'a> {
        Node(self.0.and_then(Value::as_object).and_then(|object| object.get(name)))
    }

    /// Element of an array
    pub fn index(self, position: usize) -> Node<'a> {
        Node(self.0.and_then(Value::as_array).and_then(|array| array.get(position)))
    }

    /// Follow a chain of object keys
    pub fn path(self, keys: &[&str]) -> Node<'a> {
        keys.iter().fold(self, |node, key| node.key(key))
    }

    /// Array elements; empty when this node is not an array
    pub fn items(self) -> impl Iterator<Item = Node<'a>> {
        self.0
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|value| Node(Some(value)))
    }

    pub fn exists(self) -> bool {
        self.0.is_some()
    }

    pub fn is_array(self) -> bool {
        self.0.map_or(false, Value::is_array)
    }

    pub fn as_str(self) -> Option<&'a str> {
        self.0.and_then(Value::as_str)
    }

    /// Display text of a renderer text object: `runs[0].text`, else `simpleText`
    pub fn text(self) -> Option<&'a str> {
        self.key("runs")
            .index(0)
            .key("text")
            .as_str()
            .or_else(|| self.key("simpleText").as_str())
    }
}
