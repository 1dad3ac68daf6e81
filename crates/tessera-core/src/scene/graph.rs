// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An index-based scene-graph arena.
//!
//! Nodes are stored in a flat `Vec` and refer to their children by [`NodeId`].
//! Meshes are not owned by the graph; a node only lists indices into the mesh
//! table of whatever imported it.

use std::collections::HashSet;

/// The index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One node of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneNode {
    /// Name taken from the source file, possibly empty.
    pub name: String,
    /// Indices into the importer's mesh table.
    pub meshes: Vec<usize>,
    /// Child nodes, in declaration order.
    pub children: Vec<NodeId>,
}

/// A flat arena of [`SceneNode`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneGraph {
    /// All nodes, addressed by [`NodeId`].
    pub nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a detached node and returns its id.
    pub fn add_node(&mut self, name: impl Into<String>, meshes: Vec<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            meshes,
            children: Vec::new(),
        });
        id
    }

    /// Attaches `child` under `parent`. Returns `false` if either id is unknown.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child.0 >= self.nodes.len() {
            return false;
        }
        match self.nodes.get_mut(parent.0) {
            Some(node) => {
                node.children.push(child);
                true
            }
            None => false,
        }
    }

    /// Returns the node behind `id`.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collects the mesh indices reachable from `root`, in pre-order.
    ///
    /// A node's own meshes come before those of its children, and children are
    /// visited in declaration order. The traversal uses an explicit stack, and a
    /// node reached a second time (shared subtree or cycle) is skipped. Unknown
    /// ids are ignored.
    pub fn flatten(&self, root: NodeId) -> Vec<usize> {
        let mut meshes = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                log::warn!("SceneGraph: node {} does not exist, skipping", id.0);
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            meshes.extend_from_slice(&node.meshes);
            // Reversed so the first child is popped first.
            stack.extend(node.children.iter().rev().copied());
        }

        meshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_is_preorder() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("root", vec![0]);
        let a = graph.add_node("a", vec![1, 2]);
        let b = graph.add_node("b", vec![4]);
        let a1 = graph.add_node("a1", vec![3]);
        assert!(graph.add_child(root, a));
        assert!(graph.add_child(root, b));
        assert!(graph.add_child(a, a1));

        assert_eq!(graph.flatten(root), vec![0, 1, 2, 3, 4]);
        assert_eq!(graph.flatten(a), vec![1, 2, 3]);
    }

    #[test]
    fn test_flatten_survives_cycles_and_deep_chains() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("root", vec![0]);
        let mut parent = root;
        for i in 1..100_000 {
            let child = graph.add_node("", vec![i]);
            graph.add_child(parent, child);
            parent = child;
        }
        graph.add_child(parent, root);

        let meshes = graph.flatten(root);
        assert_eq!(meshes.len(), 100_000);
        assert_eq!(meshes[99_999], 99_999);
    }

    #[test]
    fn test_add_child_rejects_unknown_ids() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("root", vec![]);
        assert!(!graph.add_child(root, NodeId(5)));
        assert!(!graph.add_child(NodeId(5), root));
        assert!(graph.flatten(NodeId(9)).is_empty());
    }
}
