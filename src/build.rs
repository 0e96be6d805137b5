use std::collections::HashSet;

use crate::config::LayoutConfig;
use crate::ir::{QueryEvent, QueryTree, QueryTreeNode};
use crate::layout::{
    Anomaly, CanonicalGraph, Diagnostics, GraphEdge, GraphNode, MetricsSnapshot, NodeKind, Point,
    Port, Relation,
};
use crate::status::normalize_opt;

const DEFAULT_TREE_LABEL: &str = "Query Node";
const RUNNING_STATE: &str = "RUNNING";

/// Which input shape a repository fetch should be drawn from.
#[derive(Debug, Clone, Copy)]
pub enum GraphSource<'a> {
    Tree(&'a QueryTreeNode),
    Events(&'a [QueryEvent]),
    Empty,
}

impl<'a> GraphSource<'a> {
    /// A root with children is drawn as a tree. A bare root falls back to the
    /// event timeline when there is one.
    pub fn select(tree: &'a QueryTree) -> Self {
        match &tree.root {
            Some(root) if root.has_children() => GraphSource::Tree(root),
            _ if !tree.events.is_empty() => GraphSource::Events(&tree.events),
            Some(root) => GraphSource::Tree(root),
            None => GraphSource::Empty,
        }
    }
}

pub fn build_graph(source: GraphSource<'_>, config: &LayoutConfig) -> CanonicalGraph {
    match source {
        GraphSource::Tree(root) => build_from_tree(root, config),
        GraphSource::Events(events) => build_from_events(events, config),
        GraphSource::Empty => CanonicalGraph::default(),
    }
}

/// Per-call accumulator; owns the visited set so concurrent builds share nothing.
struct GraphBuilder<'c> {
    config: &'c LayoutConfig,
    visited: HashSet<String>,
    edge_ids: HashSet<String>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    diagnostics: Diagnostics,
}

impl<'c> GraphBuilder<'c> {
    fn new(config: &'c LayoutConfig) -> Self {
        Self {
            config,
            visited: HashSet::new(),
            edge_ids: HashSet::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Returns false if the id was already emitted.
    fn add_node(&mut self, node: GraphNode) -> bool {
        if !self.visited.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    fn add_edge(&mut self, edge: GraphEdge) {
        if edge.source == edge.target {
            self.diagnostics.push(Anomaly::SelfEdge {
                id: edge.source.clone(),
            });
            return;
        }
        if self.edge_ids.insert(edge.id.clone()) {
            self.edges.push(edge);
        }
    }

    fn node(&self, id: String, kind: NodeKind, label: String, state: Option<&str>) -> GraphNode {
        GraphNode {
            id,
            kind,
            label,
            status: normalize_opt(state),
            metrics: MetricsSnapshot::default(),
            error_message: None,
            ports: Port::ALL,
            width: self.config.node_width,
            height: self.config.node_height,
            position: Point::default(),
        }
    }

    fn finish(self) -> CanonicalGraph {
        CanonicalGraph {
            nodes: self.nodes,
            edges: self.edges,
            diagnostics: self.diagnostics,
        }
    }
}

pub fn build_from_tree(root: &QueryTreeNode, config: &LayoutConfig) -> CanonicalGraph {
    let mut builder = GraphBuilder::new(config);
    // (node, parent id) in pre-order; children pushed reversed to keep their order.
    let mut stack: Vec<(&QueryTreeNode, Option<&str>)> = vec![(root, None)];

    while let Some((tree_node, parent)) = stack.pop() {
        if parent == Some(tree_node.id.as_str()) {
            builder.diagnostics.push(Anomaly::SelfEdge {
                id: tree_node.id.clone(),
            });
            continue;
        }

        let node = tree_graph_node(&builder, tree_node);
        if !builder.add_node(node) {
            builder.diagnostics.push(Anomaly::DuplicateNode {
                id: tree_node.id.clone(),
                parent: parent.map(str::to_string),
            });
            continue;
        }

        if let Some(parent) = parent {
            let mut edge = GraphEdge::new(parent, &tree_node.id, Relation::ParentChild);
            edge.animated = is_running(tree_node.state.as_deref());
            builder.add_edge(edge);
        }

        for child in tree_node.children.iter().rev() {
            stack.push((child, Some(tree_node.id.as_str())));
        }
    }

    builder.finish()
}

fn tree_graph_node(builder: &GraphBuilder<'_>, tree_node: &QueryTreeNode) -> GraphNode {
    let label = non_empty(tree_node.operator_type.as_deref())
        .or(non_empty(tree_node.node_type.as_deref()))
        .unwrap_or(DEFAULT_TREE_LABEL)
        .to_string();
    let mut node = builder.node(
        tree_node.id.clone(),
        NodeKind::Tree,
        label,
        tree_node.state.as_deref(),
    );
    node.metrics = MetricsSnapshot {
        execution_time: tree_node.execution_time,
        input_rows: tree_node.input_rows,
        output_rows: tree_node.output_rows,
        input_bytes: tree_node.input_bytes,
        output_bytes: tree_node.output_bytes,
        cpu_time: tree_node.cpu_time,
        wall_time: tree_node.wall_time,
        memory_bytes: tree_node.memory_bytes,
    };
    node.error_message = tree_node.error_message.clone();
    node
}

pub fn event_node_id(index: usize) -> String {
    format!("event-{index}")
}

pub fn build_from_events(events: &[QueryEvent], config: &LayoutConfig) -> CanonicalGraph {
    let mut builder = GraphBuilder::new(config);

    for (index, event) in events.iter().enumerate() {
        let id = event_node_id(index);
        let mut node = builder.node(
            id.clone(),
            NodeKind::Event,
            event.event_type.clone(),
            event.state.as_deref(),
        );
        node.metrics = MetricsSnapshot {
            execution_time: event
                .cpu_time_ms
                .filter(|ms| *ms != 0.0)
                .or(event.wall_time_ms),
            input_rows: event.total_rows,
            input_bytes: event.total_bytes,
            cpu_time: event.cpu_time_ms,
            wall_time: event.wall_time_ms,
            memory_bytes: event.peak_memory_bytes,
            ..MetricsSnapshot::default()
        };
        node.error_message = event.error_message.clone();
        builder.add_node(node);

        if index > 0 {
            let previous = event_node_id(index - 1);
            let mut edge = GraphEdge::new(&previous, &id, Relation::Sequence);
            edge.animated = is_running(event.state.as_deref());
            builder.add_edge(edge);
        }
    }

    builder.finish()
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.is_empty())
}

fn is_running(state: Option<&str>) -> bool {
    state.is_some_and(|state| state.eq_ignore_ascii_case(RUNNING_STATE))
}
