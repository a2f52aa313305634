use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::path::ContainerKind;

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

#[derive(Debug)]
pub enum Node {
    Leaf(Value),
    Mapping(IndexMap<SmolStr, NodeId>),
    /// Sparse: positions written by index may leave gaps, and
    /// materialization keeps only the occupied positions in index order.
    Sequence(BTreeMap<usize, NodeId>),
}

impl Node {
    pub fn empty(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Mapping => Node::Mapping(IndexMap::new()),
            ContainerKind::Sequence => Node::Sequence(BTreeMap::new()),
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Node::Leaf(_) => None,
            Node::Mapping(_) => Some(ContainerKind::Mapping),
            Node::Sequence(_) => Some(ContainerKind::Sequence),
        }
    }
}

/// Address of a child inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKey {
    Name(SmolStr),
    Index(usize),
}

/// What currently occupies a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Unset,
    Leaf(NodeId),
    Mapping(NodeId),
    Sequence(NodeId),
}

/// Node storage for a single build. The root is always a mapping.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Mapping(IndexMap::new())],
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Allocates `value`, lowering JSON objects and arrays into containers
    /// so later entries can still write beneath them.
    pub fn alloc_value(&mut self, value: Value) -> NodeId {
        match value {
            Value::Object(map) => {
                let id = self.alloc(Node::empty(ContainerKind::Mapping));
                for (key, child) in map {
                    let child = self.alloc_value(child);
                    self.set_child(id, SlotKey::Name(SmolStr::new(key)), child);
                }
                id
            }
            Value::Array(items) => {
                let id = self.alloc(Node::empty(ContainerKind::Sequence));
                for (index, item) in items.into_iter().enumerate() {
                    let child = self.alloc_value(item);
                    self.set_child(id, SlotKey::Index(index), child);
                }
                id
            }
            leaf => self.alloc(Node::Leaf(leaf)),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn container_kind(&self, id: NodeId) -> Option<ContainerKind> {
        self.get(id).and_then(Node::container_kind)
    }

    /// Next append position of a sequence (its element count).
    pub fn sequence_len(&self, id: NodeId) -> usize {
        match self.get(id) {
            Some(Node::Sequence(items)) => items.len(),
            _ => 0,
        }
    }

    pub fn child(&self, parent: NodeId, key: &SlotKey) -> Option<NodeId> {
        match (self.get(parent)?, key) {
            (Node::Mapping(entries), SlotKey::Name(name)) => entries.get(name).copied(),
            (Node::Sequence(items), SlotKey::Index(index)) => items.get(index).copied(),
            _ => None,
        }
    }

    pub fn slot(&self, parent: NodeId, key: &SlotKey) -> Slot {
        let Some(id) = self.child(parent, key) else {
            return Slot::Unset;
        };
        match self.get(id) {
            Some(Node::Leaf(_)) => Slot::Leaf(id),
            Some(Node::Mapping(_)) => Slot::Mapping(id),
            Some(Node::Sequence(_)) => Slot::Sequence(id),
            None => Slot::Unset,
        }
    }

    /// Links `child` under `parent`. Callers check that the slot is unset.
    pub fn set_child(&mut self, parent: NodeId, key: SlotKey, child: NodeId) {
        match (self.nodes.get_mut(parent), key) {
            (Some(Node::Mapping(entries)), SlotKey::Name(name)) => {
                entries.insert(name, child);
            }
            (Some(Node::Sequence(items)), SlotKey::Index(index)) => {
                items.insert(index, child);
            }
            _ => {}
        }
    }

    pub fn into_value(mut self) -> Value {
        self.take_value(ROOT)
    }

    fn take_value(&mut self, id: NodeId) -> Value {
        let Some(node) = self.nodes.get_mut(id) else {
            return Value::Null;
        };
        match std::mem::replace(node, Node::Leaf(Value::Null)) {
            Node::Leaf(value) => value,
            Node::Mapping(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, child) in entries {
                    let value = self.take_value(child);
                    map.insert(key.to_string(), value);
                }
                Value::Object(map)
            }
            Node::Sequence(items) => Value::Array(
                items
                    .into_values()
                    .map(|child| self.take_value(child))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMode {
    /// Written through explicit indices.
    Ordered,
    /// Written only through appends.
    Unordered,
}

/// Per-build record of how each sequence has been addressed.
///
/// Lives only for the duration of one build and is never stored on the tree.
#[derive(Debug, Default)]
pub struct ArrayModes {
    modes: HashMap<NodeId, ArrayMode>,
}

impl ArrayModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<ArrayMode> {
        self.modes.get(&id).copied()
    }

    pub fn mark(&mut self, id: NodeId, mode: ArrayMode) {
        self.modes.insert(id, mode);
    }
}
