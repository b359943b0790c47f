//! Parsed record trees.
//!
//! A [`RecordTree`] is the read-only view of one decoded resource: an arena
//! of [`RecordNode`]s addressed by [`NodeId`], rooted at [`NodeId::ROOT`].
//! Trees are produced by the record parser through [`RecordTreeBuilder`] and
//! never mutated afterwards, so they can be shared across search workers
//! behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::{FieldValue, Number, ResourceRef};

/// Index of a node inside its [`RecordTree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The resource root.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime kind of a node, used for structural equality checks.
///
/// Two nodes have the same shape when the parser produced them from the
/// same structure definition (e.g. every `Actor` entry of an area file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shape(Arc<str>);

impl Shape {
    pub fn new(kind: impl AsRef<str>) -> Self {
        Shape(Arc::from(kind.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Shape {
    fn from(kind: &str) -> Self {
        Shape::new(kind)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One field or substructure of a parsed resource.
#[derive(Debug, Clone)]
pub struct RecordNode {
    name: String,
    offset: u64,
    shape: Shape,
    composite: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: FieldValue,
}

impl RecordNode {
    /// Field or structure name. Not unique among siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset of the node inside the resource.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` for substructures: nodes declared struct-typed or
    /// holding children.
    pub fn is_composite(&self) -> bool {
        self.composite || !self.children.is_empty()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn as_numeric(&self) -> Option<Number> {
        self.value.as_numeric()
    }

    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    pub fn as_reference(&self) -> Option<&ResourceRef> {
        self.value.as_reference()
    }

    pub fn as_bitfield(&self) -> Option<u64> {
        self.value.as_bitfield()
    }
}

/// Immutable tree of one parsed resource.
#[derive(Debug, Clone)]
pub struct RecordTree {
    nodes: Vec<RecordNode>,
    offset_index: HashMap<u64, NodeId>,
}

impl RecordTree {
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another tree and is out of bounds.
    pub fn node(&self, id: NodeId) -> &RecordNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&RecordNode> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Number of nodes, root included. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates from `id` up to the root, both included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Shapes from the root down to and including `id`.
    pub fn shape_chain(&self, id: NodeId) -> Vec<Shape> {
        let mut chain: Vec<Shape> = self
            .ancestors(id)
            .map(|ancestor| self.node(ancestor).shape.clone())
            .collect();
        chain.reverse();
        chain
    }

    /// All composite descendants of `id` in depth-first pre-order,
    /// excluding `id` itself.
    pub fn composite_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            let node = self.node(next);
            if node.is_composite() {
                found.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// The field occupying an absolute byte offset of the resource.
    ///
    /// Only non-composite nodes are indexed; when several fields share an
    /// offset the first one in pre-order wins.
    pub fn field_at_offset(&self, offset: u64) -> Option<NodeId> {
        self.offset_index.get(&offset).copied()
    }

    /// Human-readable location of `id`: names from the root, joined by ` > `.
    pub fn path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .map(|ancestor| self.node(ancestor).name.as_str())
            .collect();
        names.reverse();
        names.join(" > ")
    }

    /// Node ids in depth-first pre-order, root first.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        order
    }
}

/// Iterator returned by [`RecordTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a RecordTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.node(current).parent;
        Some(current)
    }
}

/// Incremental constructor for [`RecordTree`].
///
/// Nodes can only be attached under nodes the builder already issued, which
/// keeps every tree acyclic and finite.
///
/// # Example
///
/// ```
/// use structseek::{FieldValue, RecordTreeBuilder};
///
/// let mut builder = RecordTreeBuilder::new("AR0602.ARE", "ARE");
/// let root = builder.root();
/// let actor = builder.structure(root, "Actor 0", 0x11c, "Actor");
/// builder.field(actor, "Name", 0x11c, "TextString", FieldValue::text("Imoen"));
/// let tree = builder.build();
///
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.path(tree.field_at_offset(0x11c).unwrap()), "AR0602.ARE > Actor 0 > Name");
/// ```
#[derive(Debug)]
pub struct RecordTreeBuilder {
    nodes: Vec<RecordNode>,
}

impl RecordTreeBuilder {
    /// Starts a tree with a composite root at offset 0.
    pub fn new(root_name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        RecordTreeBuilder {
            nodes: vec![RecordNode {
                name: root_name.into(),
                offset: 0,
                shape: shape.into(),
                composite: true,
                parent: None,
                children: Vec::new(),
                value: FieldValue::none(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Adds a substructure under `parent`.
    pub fn structure(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        offset: u64,
        shape: impl Into<Shape>,
    ) -> NodeId {
        self.push(parent, name.into(), offset, shape.into(), true, FieldValue::none())
    }

    /// Adds a field under `parent`.
    pub fn field(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        offset: u64,
        shape: impl Into<Shape>,
        value: FieldValue,
    ) -> NodeId {
        self.push(parent, name.into(), offset, shape.into(), false, value)
    }

    fn push(
        &mut self,
        parent: NodeId,
        name: String,
        offset: u64,
        shape: Shape,
        composite: bool,
        value: FieldValue,
    ) -> NodeId {
        assert!(
            parent.index() < self.nodes.len(),
            "parent {parent} was not issued by this builder"
        );
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RecordNode {
            name,
            offset,
            shape,
            composite,
            parent: Some(parent),
            children: Vec::new(),
            value,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Finalizes the tree and builds the absolute-offset index.
    pub fn build(self) -> RecordTree {
        let mut tree = RecordTree {
            nodes: self.nodes,
            offset_index: HashMap::new(),
        };
        let mut index = HashMap::new();
        for id in tree.preorder() {
            let node = tree.node(id);
            if !node.is_composite() {
                index.entry(node.offset).or_insert(id);
            }
        }
        tree.offset_index = index;
        tree
    }
}
