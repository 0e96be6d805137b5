use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use futures::future::BoxFuture;
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{HashMap, HashSet};

use super::layered::{FlowDirection, LayeredEngine, LayeredResult, LayeredSpec};
use super::{LayoutError, NodeBox, Point, orthogonal_route, path_bend_count};

/// Default [`LayeredEngine`]: dagre ranking/ordering/positioning followed by
/// orthogonal port-to-port routing.
///
/// The dagre pass runs on tokio's blocking pool, so callers need a tokio
/// runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreEngine;

impl LayeredEngine for DagreEngine {
    fn compute_layout(
        &self,
        spec: LayeredSpec,
    ) -> BoxFuture<'static, Result<LayeredResult, LayoutError>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || run_dagre(&spec))
                .await
                .map_err(|err| LayoutError::EngineTask(err.to_string()))
        })
    }
}

fn dagre_rankdir(direction: FlowDirection) -> &'static str {
    match direction {
        FlowDirection::TopToBottom => "TB",
    }
}

pub(super) fn run_dagre(spec: &LayeredSpec) -> LayeredResult {
    if spec.nodes.is_empty() {
        return LayeredResult::default();
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(spec.direction).to_string());
    graph_config.nodesep = Some(spec.node_spacing);
    graph_config.ranksep = Some(spec.rank_spacing);
    graph_config.marginx = Some(spec.margin);
    graph_config.marginy = Some(spec.margin);
    dagre_graph.set_graph(graph_config);

    let mut known: HashSet<&str> = HashSet::new();
    for node in &spec.nodes {
        let mut dagre_node = DagreNode::default();
        dagre_node.width = node.width;
        dagre_node.height = node.height;
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
        known.insert(node.id.as_str());
    }

    // Single-edge graph: a pair linked by two relations is ranked once.
    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in &spec.edges {
        if edge.source == edge.target
            || !known.contains(edge.source.as_str())
            || !known.contains(edge.target.as_str())
        {
            continue;
        }
        let from = edge.source.clone();
        let to = edge.target.clone();
        if !edge_set.insert((from.clone(), to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    place_and_route(spec, |id| {
        dagre_graph
            .node(id)
            .map(|dagre_node| Point::new(dagre_node.x, dagre_node.y))
    })
}

/// Reads node centers through `center_of` and routes every edge whose ends
/// were placed. Nodes without a finite center are left out, so the caller
/// keeps their previous position.
fn place_and_route(
    spec: &LayeredSpec,
    center_of: impl Fn(&String) -> Option<Point>,
) -> LayeredResult {
    let mut result = LayeredResult::default();
    let mut sizes: HashMap<&str, (f32, f32)> = HashMap::new();
    for node in &spec.nodes {
        let Some(center) = center_of(&node.id) else {
            continue;
        };
        if !(center.x.is_finite() && center.y.is_finite()) {
            tracing::warn!(node = %node.id, "dagre returned a non-finite position; skipping node");
            continue;
        }
        result.nodes.insert(node.id.clone(), center);
        sizes.insert(node.id.as_str(), (node.width, node.height));
    }

    let mut bends = 0usize;
    for edge in &spec.edges {
        let (Some(from), Some(to)) = (
            node_box(&result, &sizes, &edge.source),
            node_box(&result, &sizes, &edge.target),
        ) else {
            continue;
        };
        let route = orthogonal_route(
            from,
            edge.source_port,
            to,
            edge.target_port,
            spec.port_stub,
        );
        bends += path_bend_count(&route);
        result.edges.insert(edge.id.clone(), route);
    }

    tracing::debug!(
        nodes = result.nodes.len(),
        edges = result.edges.len(),
        bends,
        "dagre routes built"
    );
    result
}

fn node_box(
    result: &LayeredResult,
    sizes: &HashMap<&str, (f32, f32)>,
    id: &str,
) -> Option<NodeBox> {
    let center = result.nodes.get(id)?;
    let (width, height) = sizes.get(id)?;
    Some(NodeBox::centered(*center, *width, *height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_from_events, build_from_tree};
    use crate::config::LayoutConfig;
    use crate::ir::{QueryEvent, QueryTreeNode};
    use crate::layout::{Port, is_orthogonal, layout_layered};

    fn scenario_a() -> QueryTreeNode {
        QueryTreeNode::new("root")
            .with_child(QueryTreeNode::new("leaf"))
            .with_child(
                QueryTreeNode::new("join")
                    .with_child(QueryTreeNode::new("scan-a"))
                    .with_child(QueryTreeNode::new("scan-b")),
            )
    }

    #[test]
    fn empty_spec_yields_empty_result() {
        let config = LayoutConfig::default();
        let graph = build_from_events(&[], &config);
        let spec = LayeredSpec::from_graph(&graph, &config);
        let result = run_dagre(&spec);
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn non_finite_center_skips_only_that_node() {
        let config = LayoutConfig::default();
        let graph = build_from_tree(&scenario_a(), &config);
        let spec = LayeredSpec::from_graph(&graph, &config);

        let result = place_and_route(&spec, |id| match id.as_str() {
            "join" => Some(Point::new(f32::NAN, 0.0)),
            "scan-b" => None,
            _ => Some(Point::new(0.0, 0.0)),
        });

        let mut placed: Vec<&str> = result.nodes.keys().map(String::as_str).collect();
        placed.sort_unstable();
        assert_eq!(placed, ["leaf", "root", "scan-a"]);
        // only root -> leaf has both ends placed
        assert_eq!(result.edges.len(), 1);
        assert!(result.edges.contains_key("root:parentChild:leaf"));
    }

    #[tokio::test]
    async fn tree_flows_top_to_bottom_with_orthogonal_routes() {
        let config = LayoutConfig::default();
        let graph = build_from_tree(&scenario_a(), &config);
        let laid = layout_layered(graph, &DagreEngine, &config)
            .await
            .expect("dagre layout");

        let y = |id: &str| {
            laid.nodes
                .iter()
                .find(|node| node.id == id)
                .expect("node present")
                .position
                .y
        };
        assert!(y("root") < y("join"));
        assert!(y("join") < y("scan-a"));

        for edge in &laid.edges {
            assert!(edge.route.len() >= 2);
            assert!(is_orthogonal(&edge.route), "{:?}", edge.route);
            let source = laid.nodes.iter().find(|n| n.id == edge.source).expect("source");
            let target = laid.nodes.iter().find(|n| n.id == edge.target).expect("target");
            assert_eq!(edge.route[0], source.port_anchor(Port::Bottom));
            assert_eq!(edge.route[edge.route.len() - 1], target.port_anchor(Port::Top));
        }
    }

    #[tokio::test]
    async fn event_chain_routes_leave_right_and_enter_left() {
        let config = LayoutConfig::default();
        let events: Vec<QueryEvent> = (0..3)
            .map(|i| QueryEvent::new(format!("E{i}"), format!("t{i}")))
            .collect();
        let graph = build_from_events(&events, &config);
        let laid = layout_layered(graph, &DagreEngine, &config)
            .await
            .expect("dagre layout");
        assert_eq!(laid.edges.len(), 2);
        for edge in &laid.edges {
            let source = laid.nodes.iter().find(|n| n.id == edge.source).expect("source");
            let target = laid.nodes.iter().find(|n| n.id == edge.target).expect("target");
            assert_eq!(edge.route[0], source.port_anchor(Port::Right));
            assert_eq!(edge.route[edge.route.len() - 1], target.port_anchor(Port::Left));
            assert!(is_orthogonal(&edge.route));
        }
    }
}
