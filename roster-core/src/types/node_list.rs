//! Immutable node snapshots.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Node;

/// An ordered, immutable listing of nodes.
///
/// Cloning is cheap (reference-counted), so a listing can be handed to
/// callers while the registry that produced it moves on to a newer one.
/// A `NodeList` is never edited in place; registries build a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeList {
    items: Arc<[Node]>,
}

impl NodeList {
    /// Creates an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the listing has no nodes.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the nodes in listing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    /// Returns the listing as a slice.
    pub fn as_slice(&self) -> &[Node] {
        &self.items
    }

    /// Returns the node identifiers in listing order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|n| n.id.as_str()).collect()
    }

    /// Linear scan for a node with the given identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|n| n.id == id)
    }

    /// Returns the node with the given identifier.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Returns true if both listings share the same allocation.
    pub fn ptr_eq(&self, other: &NodeList) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl Default for NodeList {
    fn default() -> Self {
        Self { items: Arc::from(Vec::new()) }
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        Self { items: nodes.into() }
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl Deref for NodeList {
    type Target = [Node];

    fn deref(&self) -> &[Node] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for NodeList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Node>::deserialize(deserializer).map(NodeList::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(ids: &[&str]) -> NodeList {
        ids.iter().map(|id| Node::new(*id)).collect()
    }

    #[test]
    fn test_contains_and_get() {
        let nodes = list(&["a", "b"]);
        assert!(nodes.contains("a"));
        assert!(!nodes.contains("c"));
        assert_eq!(nodes.get("b").map(|n| n.id.as_str()), Some("b"));
        assert_eq!(nodes.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_clone_shares_allocation() {
        let nodes = list(&["a"]);
        let copy = nodes.clone();
        assert!(nodes.ptr_eq(&copy));
        assert!(!nodes.ptr_eq(&list(&["a"])));
    }

    #[test]
    fn test_json_is_plain_array() {
        let nodes = list(&["a"]);
        let json = serde_json::to_value(&nodes).unwrap();
        assert!(json.is_array());

        let back: NodeList = serde_json::from_value(json).unwrap();
        assert_eq!(back.ids(), vec!["a"]);
    }

    proptest! {
        #[test]
        fn contains_matches_membership(ids in proptest::collection::vec("[a-z]{1,8}", 0..20), probe in "[a-z]{1,8}") {
            let nodes: NodeList = ids.iter().map(Node::new).collect();
            prop_assert_eq!(nodes.contains(&probe), ids.contains(&probe));
            prop_assert_eq!(nodes.len(), ids.len());
        }
    }
}
