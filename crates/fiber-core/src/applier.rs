//! Host capability interface and an in-memory host.

use std::fmt::Write as _;

use crate::hash::default::HashMap;
use crate::element::{Event, EventHandler, PropValue, NODE_VALUE};
use crate::hash::OrderedMap;
use crate::{NodeError, NodeId};

/// Mutation primitives of the output tree.
///
/// The core only ever calls these during node creation in the work loop and
/// during commit; the host is free to map them onto any native tree.
pub trait Applier {
    fn create_node(&mut self, tag: &str) -> NodeId;
    fn create_text_node(&mut self) -> NodeId;
    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue)
        -> Result<(), NodeError>;
    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    /// Appends `child` as the last child of `parent`.
    fn insert_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryNodeKind {
    Element(String),
    Text,
}

pub struct MemoryNode {
    kind: MemoryNodeKind,
    properties: OrderedMap<String, PropValue>,
    listeners: HashMap<String, Vec<EventHandler>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            properties: OrderedMap::default(),
            listeners: HashMap::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> &MemoryNodeKind {
        &self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Element(tag) => Some(tag),
            MemoryNodeKind::Text => None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.get(event_type).map_or(0, Vec::len)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Host call recorded by [`MemoryApplier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryMutation {
    Create { node: NodeId },
    SetProperty { node: NodeId, name: String },
    RemoveProperty { node: NodeId, name: String },
    AddListener { node: NodeId, event_type: String },
    RemoveListener { node: NodeId, event_type: String },
    Insert { parent: NodeId, child: NodeId },
    Remove { parent: NodeId, child: NodeId },
}

/// Arena-backed document used by tests and headless hosts.
#[derive(Default)]
pub struct MemoryApplier {
    nodes: Vec<MemoryNode>,
    mutations: Vec<MemoryMutation>,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes.get(id).ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes.get_mut(id).ok_or(NodeError::Missing { id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], NodeError> {
        Ok(self.node(id)?.children())
    }

    pub fn property(&self, id: NodeId, name: &str) -> Result<Option<&PropValue>, NodeError> {
        Ok(self.node(id)?.property(name))
    }

    /// Concatenated `nodeValue` of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> Result<String, NodeError> {
        let node = self.node(id)?;
        if node.kind == MemoryNodeKind::Text {
            return Ok(node
                .property(NODE_VALUE)
                .map(ToString::to_string)
                .unwrap_or_default());
        }
        node.children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    /// Host calls made since the last call to this method.
    pub fn take_mutations(&mut self) -> Vec<MemoryMutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Delivers an event to the listeners registered on `target` and returns
    /// how many ran. Events do not bubble.
    pub fn dispatch_event(
        &self,
        target: NodeId,
        event_type: &str,
        value: Option<PropValue>,
    ) -> Result<usize, NodeError> {
        let handlers = self
            .node(target)?
            .listeners
            .get(event_type)
            .cloned()
            .unwrap_or_default();
        let event = Event {
            event_type: event_type.to_owned(),
            target,
            value,
        };
        for handler in &handlers {
            handler(&event);
        }
        Ok(handlers.len())
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        match root {
            Some(root_id) => self.dump_node(&mut output, root_id, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text => {
                let value = node.property(NODE_VALUE).map(ToString::to_string);
                let _ = writeln!(output, "{indent}[{id}] {:?}", value.unwrap_or_default());
            }
            MemoryNodeKind::Element(tag) => {
                let _ = write!(output, "{indent}[{id}] <{tag}");
                for (name, value) in node.properties() {
                    let _ = write!(output, " {name}={value:?}");
                }
                let _ = writeln!(output, ">");
            }
        }
        for child in &node.children {
            self.dump_node(output, *child, depth + 1);
        }
    }

    fn push_node(&mut self, kind: MemoryNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode::new(kind));
        self.mutations.push(MemoryMutation::Create { node: id });
        id
    }

    fn detach(&mut self, child: NodeId) -> Result<(), NodeError> {
        let parent = self.node(child)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|id| *id != child);
        }
        self.node_mut(child)?.parent = None;
        Ok(())
    }
}

impl Applier for MemoryApplier {
    fn create_node(&mut self, tag: &str) -> NodeId {
        self.push_node(MemoryNodeKind::Element(tag.to_owned()))
    }

    fn create_text_node(&mut self) -> NodeId {
        self.push_node(MemoryNodeKind::Text)
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), NodeError> {
        self.node_mut(node)?
            .properties
            .insert(name.to_owned(), value.clone());
        self.mutations.push(MemoryMutation::SetProperty {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        self.node_mut(node)?.properties.shift_remove(name);
        self.mutations.push(MemoryMutation::RemoveProperty {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        self.node_mut(node)?
            .listeners
            .entry(event_type.to_owned())
            .or_default()
            .push(handler.clone());
        self.mutations.push(MemoryMutation::AddListener {
            node,
            event_type: event_type.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        if let Some(handlers) = self.node_mut(node)?.listeners.get_mut(event_type) {
            handlers.retain(|existing| !std::rc::Rc::ptr_eq(existing, handler));
        }
        self.mutations.push(MemoryMutation::RemoveListener {
            node,
            event_type: event_type.to_owned(),
        });
        Ok(())
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations.push(MemoryMutation::Insert { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(NodeError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.mutations.push(MemoryMutation::Remove { parent, child });
        Ok(())
    }
}
