use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;

use super::{GraphEdge, GraphNode, Point, straight_route};

/// Horizontal span granted to one node by the rank layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSpan {
    pub rank: usize,
    pub left: f32,
    pub right: f32,
}

impl RankSpan {
    pub fn midpoint(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Touching boundaries do not count as overlap.
    pub fn overlaps(&self, other: &RankSpan) -> bool {
        self.left < other.right && other.left < self.right
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankLayout {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub spans: BTreeMap<String, RankSpan>,
}

/// Tree view of a canonical node list, indexed by node position.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub roots: Vec<usize>,
    pub children: Vec<Vec<usize>>,
    /// Every reachable node, parents before their children.
    pub preorder: Vec<usize>,
    pub depth: Vec<usize>,
}

impl Forest {
    /// First incoming edge (in edge order) decides the parent. Nodes that no
    /// root reaches, as in a cycle, become roots in node order.
    pub fn from_edges(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();

        let mut parent: Vec<Option<usize>> = vec![None; nodes.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for edge in edges {
            let (Some(&from), Some(&to)) =
                (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            else {
                continue;
            };
            if from == to || parent[to].is_some() {
                continue;
            }
            parent[to] = Some(from);
            children[from].push(to);
        }

        let mut forest = Forest {
            roots: Vec::new(),
            children,
            preorder: Vec::with_capacity(nodes.len()),
            depth: vec![0; nodes.len()],
        };
        let mut seen = vec![false; nodes.len()];

        let candidates = (0..nodes.len())
            .filter(|idx| parent[*idx].is_none())
            .chain(0..nodes.len())
            .collect::<Vec<_>>();
        for root in candidates {
            if seen[root] {
                continue;
            }
            forest.roots.push(root);
            forest.walk(root, &mut seen);
        }
        forest
    }

    fn walk(&mut self, root: usize, seen: &mut [bool]) {
        let mut stack = vec![(root, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            self.depth[idx] = depth;
            self.preorder.push(idx);
            for &child in self.children[idx].iter().rev() {
                if !seen[child] {
                    stack.push((child, depth + 1));
                }
            }
        }
    }

    /// Children that the traversal actually descended into. A cycle can route
    /// an edge back to an ancestor; such back edges are not tree children.
    fn tree_children(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let depth = self.depth[idx];
        self.children[idx]
            .iter()
            .copied()
            .filter(move |child| self.depth[*child] == depth + 1)
    }
}

/// Leaf count under every node, computed once bottom-up.
pub fn subtree_weights(forest: &Forest) -> Vec<usize> {
    let mut weights = vec![1usize; forest.depth.len()];
    for &idx in forest.preorder.iter().rev() {
        let sum: usize = forest.tree_children(idx).map(|child| weights[child]).sum();
        if sum > 0 {
            weights[idx] = sum;
        }
    }
    weights
}

pub fn layout_ranks(
    mut nodes: Vec<GraphNode>,
    mut edges: Vec<GraphEdge>,
    config: &LayoutConfig,
) -> RankLayout {
    let forest = Forest::from_edges(&nodes, &edges);
    let weights = subtree_weights(&forest);
    let unit = config.min_horizontal_spacing;

    let mut spans: Vec<Option<RankSpan>> = vec![None; nodes.len()];
    let mut cursor = 0.0f32;
    for &root in &forest.roots {
        let width = weights[root] as f32 * unit;
        spans[root] = Some(RankSpan {
            rank: 0,
            left: cursor,
            right: cursor + width,
        });
        cursor += width;
    }

    // Pre-order guarantees a parent's span is known before its children split it.
    for &idx in &forest.preorder {
        let Some(span) = spans[idx] else {
            continue;
        };
        let mut left = span.left;
        for child in forest.tree_children(idx) {
            let width = weights[child] as f32 * unit;
            spans[child] = Some(RankSpan {
                rank: span.rank + 1,
                left,
                right: left + width,
            });
            left += width;
        }
    }

    let mut by_id = BTreeMap::new();
    for (node, span) in nodes.iter_mut().zip(spans) {
        let Some(span) = span else {
            continue;
        };
        node.position = Point::new(span.midpoint(), span.rank as f32 * config.vertical_spacing);
        by_id.insert(node.id.clone(), span);
    }

    let index: HashMap<&str, &GraphNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    for edge in &mut edges {
        if let (Some(from), Some(to)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            edge.route = straight_route(from, edge.source_port, to, edge.target_port);
        }
    }

    RankLayout {
        nodes,
        edges,
        spans: by_id,
    }
}
