//! Resolution graph construction and traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use depsolve_core::{PackageVariant, Requirement};

/// A node in the resolution graph. The root is the request itself; every
/// other node is a chosen package variant.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResolvedNode {
    Request,
    Package { name: String, version: String },
}

impl fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedNode::Request => f.write_str("(request)"),
            ResolvedNode::Package { name, version } if version.is_empty() => f.write_str(name),
            ResolvedNode::Package { name, version } => write!(f, "{name}-{version}"),
        }
    }
}

/// A resolved dependency graph backed by petgraph. Edges point from a
/// depender to the variant satisfying one of its requirements, labelled
/// with that requirement.
pub struct ResolveGraph {
    graph: DiGraph<ResolvedNode, Requirement>,
    /// Lookup from family name to the (single) chosen node.
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl ResolveGraph {
    /// Build the graph for a finished resolution. Requirement edges that
    /// point at families absent from the resolution (weak, conflict and
    /// ephemeral targets) are skipped.
    pub fn from_resolution(requested: &[Requirement], variants: &[PackageVariant]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let root = graph.add_node(ResolvedNode::Request);

        for v in variants {
            let idx = graph.add_node(ResolvedNode::Package {
                name: v.name.clone(),
                version: v.version.to_string(),
            });
            index.insert(v.name.clone(), idx);
        }

        let mut g = Self { graph, index, root };

        for req in requested {
            if let Some(&to) = g.index.get(req.name()) {
                g.add_edge(root, to, req.clone());
            }
        }
        for v in variants {
            let from = g.index[&v.name];
            for req in &v.requires {
                if let Some(&to) = g.index.get(req.name()) {
                    g.add_edge(from, to, req.clone());
                }
            }
        }

        g
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, req: Requirement) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, req);
        }
    }

    /// Look up a resolved family's node.
    pub fn find(&self, family: &str) -> Option<NodeIndex> {
        self.index.get(family).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ResolvedNode {
        &self.graph[idx]
    }

    /// Number of package nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct dependencies of a node, with the requirement each edge
    /// satisfies.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &Requirement)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    /// Reverse dependencies: who required this family, and how.
    pub fn dependents_of(&self, family: &str) -> Vec<(&ResolvedNode, &Requirement)> {
        match self.find(family) {
            Some(idx) => self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .map(|e| (&self.graph[e.source()], e.weight()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Render the resolution as a tree rooted at the request. Families
    /// reached more than once are expanded only the first time.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", self.graph[self.root]));

        let mut visited = HashSet::new();
        visited.insert(self.root);

        let deps = self.dependencies_of(self.root);
        let count = deps.len();
        for (i, (idx, _)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, "", is_last, 1, max_depth, &mut visited);
        }

        output
    }

    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, _)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find the requirement chain from the request to a resolved family.
    pub fn find_path(&self, family: &str) -> Option<Vec<&ResolvedNode>> {
        let target = self.find(family)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(self.root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        visited.remove(&current);
        false
    }
}
