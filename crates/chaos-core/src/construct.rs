//! Construct tree.
//!
//! Every declaration registers itself under a parent scope. The tree is an
//! arena of owned nodes; each node keeps the index of its parent so a path
//! can be computed and sibling ids checked for uniqueness. Behavior is never
//! dispatched through the tree.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SynthError;

/// Ids that are left out of the human-readable part of a logical id.
const HIDDEN_IDS: [&str; 2] = ["Resource", "Default"];

/// Maximum logical id length accepted by CloudFormation.
const MAX_LOGICAL_ID_LEN: usize = 255;

/// Length of the hash suffix appended to nested logical ids.
const HASH_LEN: usize = 8;

/// Identifier of a resource inside one template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of per-tree tags.
static NEXT_TREE: AtomicU64 = AtomicU64::new(0);

/// Handle to a node of a [`ConstructTree`]. Only valid for the tree that
/// issued it (or a clone of that tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
}

/// Arena holding the scope hierarchy of one stack.
#[derive(Debug, Clone)]
pub struct ConstructTree {
    tag: u64,
    nodes: Vec<Node>,
}

impl ConstructTree {
    /// Create a tree whose root carries `root_id` (the stack name).
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            tag: NEXT_TREE.fetch_add(1, Ordering::Relaxed),
            nodes: vec![Node {
                id: root_id.into(),
                parent: None,
                children: BTreeMap::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        self.node_id(0)
    }

    fn node_id(&self, index: usize) -> NodeId {
        NodeId {
            tree: self.tag,
            index,
        }
    }

    fn node(&self, node: NodeId) -> Option<&Node> {
        if node.tree != self.tag {
            return None;
        }
        self.nodes.get(node.index)
    }

    /// True when `node` was issued by this tree.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Register a child scope, rejecting duplicate sibling ids.
    pub fn add_child(&mut self, parent: NodeId, id: &str) -> Result<NodeId, SynthError> {
        if id.is_empty() || id.contains('/') {
            return Err(SynthError::InvalidConstructId(id.to_string()));
        }
        let Some(parent_node) = self.node(parent) else {
            return Err(SynthError::ForeignConstruct(id.to_string()));
        };
        if parent_node.children.contains_key(id) {
            return Err(SynthError::DuplicateConstructId {
                parent: self.path(parent),
                id: id.to_string(),
            });
        }

        let node = self.node_id(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            parent: Some(parent),
            children: BTreeMap::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.index) {
            parent_node.children.insert(id.to_string(), node);
        }
        Ok(node)
    }

    /// Id of `node`; `None` for a node of another tree.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.id.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Children in id order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(node)
            .into_iter()
            .flat_map(|n| n.children.values().copied())
    }

    /// Look up a direct child by id.
    pub fn child(&self, node: NodeId, id: &str) -> Option<NodeId> {
        self.node(node).and_then(|n| n.children.get(id).copied())
    }

    /// Ids from the root down to `node`, inclusive. Empty for a node of
    /// another tree.
    pub fn path_components(&self, node: NodeId) -> Vec<&str> {
        let mut components = Vec::new();
        let mut current = self.node(node);
        while let Some(n) = current {
            components.push(n.id.as_str());
            current = n.parent.and_then(|p| self.node(p));
        }
        components.reverse();
        components
    }

    /// Slash-separated path from the root, e.g. `Demo/Experiment/Role`.
    pub fn path(&self, node: NodeId) -> String {
        self.path_components(node).join("/")
    }

    /// Logical id for a node, derived from its path below the root.
    pub fn logical_id(&self, node: NodeId) -> Result<LogicalId, SynthError> {
        let components = self.path_components(node);
        match components.split_first() {
            Some((_, below_root)) if !below_root.is_empty() => {
                Ok(allocate_logical_id(below_root))
            }
            _ => Err(SynthError::ForeignConstruct(self.path(node))),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

/// Derive a logical id from path components below the stack.
///
/// A top-level id is used as-is (minus non-alphanumerics). Nested paths
/// concatenate their visible components and append a hash of the full path
/// so that different paths with the same human part stay distinct.
pub fn allocate_logical_id(components: &[&str]) -> LogicalId {
    if components.len() == 1 {
        let human = sanitize(components[0]);
        if !human.is_empty() {
            return LogicalId(human);
        }
    }

    let mut human = String::new();
    let mut previous: Option<&str> = None;
    for &component in components {
        if HIDDEN_IDS.contains(&component) || previous == Some(component) {
            previous = Some(component);
            continue;
        }
        human.push_str(&sanitize(component));
        previous = Some(component);
    }
    human.truncate(MAX_LOGICAL_ID_LEN - HASH_LEN);

    LogicalId(format!("{}{}", human, path_hash(components)))
}

fn sanitize(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn path_hash(components: &[&str]) -> String {
    let digest = Sha256::digest(components.join("/").as_bytes());
    digest
        .iter()
        .take(HASH_LEN / 2)
        .map(|b| format!("{:02X}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut tree = ConstructTree::new("Stack");
        let root = tree.root();
        let exp = tree.add_child(root, "Experiment").unwrap();
        tree.add_child(exp, "Role").unwrap();

        let err = tree.add_child(exp, "Role").unwrap_err();
        assert!(matches!(err, SynthError::DuplicateConstructId { .. }));
        assert_eq!(
            err.to_string(),
            "there is already a construct with id 'Role' under 'Stack/Experiment'"
        );

        // Same id under a different parent is fine.
        tree.add_child(root, "Role").unwrap();
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let mut tree = ConstructTree::new("Stack");
        let root = tree.root();
        assert!(matches!(
            tree.add_child(root, ""),
            Err(SynthError::InvalidConstructId(_))
        ));
        assert!(matches!(
            tree.add_child(root, "a/b"),
            Err(SynthError::InvalidConstructId(_))
        ));
    }

    #[test]
    fn test_path_and_parent() {
        let mut tree = ConstructTree::new("Stack");
        let exp = tree.add_child(tree.root(), "Experiment").unwrap();
        let role = tree.add_child(exp, "Role").unwrap();
        assert_eq!(tree.path(role), "Stack/Experiment/Role");
        assert_eq!(tree.parent(role), Some(exp));
        assert_eq!(tree.child(exp, "Role"), Some(role));
        assert_eq!(tree.children(exp).collect::<Vec<_>>(), vec![role]);
        assert_eq!(tree.id(role), Some("Role"));
    }

    #[test]
    fn test_node_of_another_tree_rejected() {
        let mut first = ConstructTree::new("First");
        let mut second = ConstructTree::new("Second");
        let foreign = first.add_child(first.root(), "Experiment").unwrap();
        second.add_child(second.root(), "Experiment").unwrap();

        assert!(!second.contains(foreign));
        assert!(matches!(
            second.add_child(foreign, "Role"),
            Err(SynthError::ForeignConstruct(_))
        ));
        assert!(matches!(
            second.add_child(first.root(), "Role"),
            Err(SynthError::ForeignConstruct(_))
        ));
        assert_eq!(second.id(foreign), None);
        assert_eq!(second.parent(foreign), None);
        assert_eq!(second.children(foreign).count(), 0);
        assert!(second.path_components(foreign).is_empty());
        assert!(second.logical_id(foreign).is_err());
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_logical_id_of_root_rejected() {
        let tree = ConstructTree::new("Stack");
        assert!(tree.logical_id(tree.root()).is_err());
    }

    #[test]
    fn test_top_level_logical_id_is_plain() {
        assert_eq!(
            allocate_logical_id(&["fis-log-group"]).as_str(),
            "fisloggroup"
        );
    }

    #[test]
    fn test_nested_logical_id_hides_resource_and_adds_hash() {
        let id = allocate_logical_id(&["Experiment", "Role", "Resource"]);
        assert!(id.as_str().starts_with("ExperimentRole"));
        assert_eq!(id.as_str().len(), "ExperimentRole".len() + HASH_LEN);

        let other = allocate_logical_id(&["Experiment", "Role", "Default"]);
        assert!(other.as_str().starts_with("ExperimentRole"));
        assert_ne!(id, other);
    }

    #[test]
    fn test_logical_id_is_deterministic() {
        let a = allocate_logical_id(&["A", "B"]);
        let b = allocate_logical_id(&["A", "B"]);
        assert_eq!(a, b);
    }
}
