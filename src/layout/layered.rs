use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::config::LayoutConfig;

use super::{CanonicalGraph, LayoutError, Point, Port, PortSide, straight_route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    TopToBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRouting {
    Orthogonal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecPort {
    pub port: Port,
    /// Always fixed; the engine may not move a port to another side.
    pub side: PortSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
    pub ports: Vec<SpecPort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecEdge {
    pub id: String,
    pub source: String,
    pub source_port: Port,
    pub target: String,
    pub target_port: Port,
}

/// Everything a layered engine needs; owned so it can cross a thread or
/// process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredSpec {
    pub direction: FlowDirection,
    pub routing: EdgeRouting,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub port_stub: f32,
    pub margin: f32,
    pub nodes: Vec<SpecNode>,
    pub edges: Vec<SpecEdge>,
}

impl LayeredSpec {
    pub fn from_graph(graph: &CanonicalGraph, config: &LayoutConfig) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| SpecNode {
                id: node.id.clone(),
                width: node.width,
                height: node.height,
                ports: Port::ALL
                    .iter()
                    .map(|port| SpecPort {
                        port: *port,
                        side: port.side(),
                    })
                    .collect(),
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|edge| SpecEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                source_port: edge.source_port,
                target: edge.target.clone(),
                target_port: edge.target_port,
            })
            .collect();
        Self {
            direction: FlowDirection::TopToBottom,
            routing: EdgeRouting::Orthogonal,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
            port_stub: config.port_stub,
            margin: config.margin,
            nodes,
            edges,
        }
    }
}

/// Engine output keyed by id. Node positions are centers; routes run from the
/// source port to the target port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayeredResult {
    pub nodes: HashMap<String, Point>,
    pub edges: HashMap<String, Vec<Point>>,
}

/// Black-box layered graph drawing capability.
pub trait LayeredEngine: Send + Sync {
    fn compute_layout(
        &self,
        spec: LayeredSpec,
    ) -> BoxFuture<'static, Result<LayeredResult, LayoutError>>;
}

/// Runs `engine` over the graph and writes its geometry back.
///
/// Ids the engine leaves out keep their previous position or route. An edge
/// that never had a route gets a straight port-to-port line, so every edge
/// leaves here with at least two points.
pub async fn layout_layered(
    mut graph: CanonicalGraph,
    engine: &dyn LayeredEngine,
    config: &LayoutConfig,
) -> Result<CanonicalGraph, LayoutError> {
    let spec = LayeredSpec::from_graph(&graph, config);
    let started = Instant::now();
    let mut result = engine.compute_layout(spec).await?;
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "layered layout resolved"
    );

    let mut kept_nodes = 0usize;
    for node in &mut graph.nodes {
        match result.nodes.remove(&node.id) {
            Some(center) if center.x.is_finite() && center.y.is_finite() => node.position = center,
            _ => kept_nodes += 1,
        }
    }

    let index: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();
    let mut kept_edges = 0usize;
    for edge in &mut graph.edges {
        match result.edges.remove(&edge.id) {
            Some(route) if route.len() >= 2 => edge.route = route,
            _ => {
                kept_edges += 1;
                if edge.route.len() < 2 {
                    if let (Some(&from), Some(&to)) =
                        (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
                    {
                        edge.route = straight_route(
                            &graph.nodes[from],
                            edge.source_port,
                            &graph.nodes[to],
                            edge.target_port,
                        );
                    }
                }
            }
        }
    }

    if kept_nodes > 0 || kept_edges > 0 {
        tracing::warn!(
            kept_nodes,
            kept_edges,
            "layered engine returned partial geometry; keeping previous values"
        );
    }
    Ok(graph)
}
