//! Abstract syntax tree for material scripts.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`].
//! Parent links are plain indices, so subtrees can be copied between trees
//! (for inheritance and imports) by offsetting ids.

use std::sync::Arc;

use crate::opcode::Opcode;

pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub nodes: Vec<AbstractNode>,
    pub roots: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct AbstractNode {
    pub file: Arc<str>,
    pub line: u32,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Object(ObjectNode),
    Property(PropertyNode),
    Atom(AtomNode),
    Import(ImportNode),
    VariableSet(VariableNode),
    VariableGet(String),
}

/// `[abstract] cls name [values] [: bases] { children }`
#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub name: String,
    /// `name` is a variable reference still to be resolved.
    pub name_is_variable: bool,
    pub cls: String,
    pub id: Opcode,
    pub is_abstract: bool,
    pub bases: Vec<String>,
    pub values: Vec<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub id: Opcode,
    pub name: String,
    pub values: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct AtomNode {
    /// Keyword opcode, or `Unspecified` for names and numbers.
    pub id: Opcode,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ImportNode {
    pub target: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct VariableNode {
    pub name: String,
    pub value: String,
}

impl AtomNode {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            id: Opcode::lookup(&value).unwrap_or(Opcode::Unspecified),
            value,
        }
    }
}

impl Ast {
    pub fn push(&mut self, node: AbstractNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &AbstractNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AbstractNode {
        &mut self.nodes[id]
    }

    pub fn object(&self, id: NodeId) -> Option<&ObjectNode> {
        match &self.nodes[id].kind {
            NodeKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn object_mut(&mut self, id: NodeId) -> Option<&mut ObjectNode> {
        match &mut self.nodes[id].kind {
            NodeKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn property(&self, id: NodeId) -> Option<&PropertyNode> {
        match &self.nodes[id].kind {
            NodeKind::Property(prop) => Some(prop),
            _ => None,
        }
    }

    pub fn atom(&self, id: NodeId) -> Option<&AtomNode> {
        match &self.nodes[id].kind {
            NodeKind::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Top-level objects in declaration order.
    pub fn objects(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(|&id| self.object(id).is_some())
    }

    /// Finds a top-level object by name.
    pub fn find_object(&self, name: &str) -> Option<NodeId> {
        self.objects()
            .find(|&id| self.object(id).is_some_and(|o| o.name == name))
    }

    /// Child ids of a node: an object's values then children, or a
    /// property's values.
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id].kind {
            NodeKind::Object(obj) => obj.values.iter().chain(&obj.children).copied().collect(),
            NodeKind::Property(prop) => prop.values.clone(),
            _ => Vec::new(),
        }
    }

    /// Copies the subtree rooted at `root` into a fresh, compact tree whose
    /// only root is node 0.
    pub fn extract(&self, root: NodeId) -> Ast {
        let mut out = Ast::default();
        let new_root = self.extract_into(root, None, &mut out);
        out.roots.push(new_root);
        out
    }

    fn extract_into(&self, id: NodeId, parent: Option<NodeId>, out: &mut Ast) -> NodeId {
        let mut node = self.nodes[id].clone();
        node.parent = parent;
        let new_id = out.push(node);
        match &self.nodes[id].kind {
            NodeKind::Object(obj) => {
                let values: Vec<NodeId> = obj
                    .values
                    .iter()
                    .map(|&v| self.extract_into(v, Some(new_id), out))
                    .collect();
                let children: Vec<NodeId> = obj
                    .children
                    .iter()
                    .map(|&c| self.extract_into(c, Some(new_id), out))
                    .collect();
                if let Some(copy) = out.object_mut(new_id) {
                    copy.values = values;
                    copy.children = children;
                }
            }
            NodeKind::Property(prop) => {
                let values: Vec<NodeId> = prop
                    .values
                    .iter()
                    .map(|&v| self.extract_into(v, Some(new_id), out))
                    .collect();
                if let NodeKind::Property(copy) = &mut out.nodes[new_id].kind {
                    copy.values = values;
                }
            }
            _ => {}
        }
        new_id
    }

    /// Appends every node of a compact tree (see [`Ast::extract`]) to this
    /// arena, attaching its root under `parent`. Returns the new root id.
    /// The caller links the returned id into the parent's child list.
    pub fn graft(&mut self, sub: &Ast, parent: Option<NodeId>) -> NodeId {
        let offset = self.nodes.len();
        for node in &sub.nodes {
            let mut node = node.clone();
            node.parent = match node.parent {
                Some(p) => Some(p + offset),
                None => parent,
            };
            match &mut node.kind {
                NodeKind::Object(obj) => {
                    obj.values.iter_mut().for_each(|v| *v += offset);
                    obj.children.iter_mut().for_each(|c| *c += offset);
                }
                NodeKind::Property(prop) => {
                    prop.values.iter_mut().for_each(|v| *v += offset);
                }
                _ => {}
            }
            self.nodes.push(node);
        }
        offset
    }
}
