use std::collections::HashSet;

use crate::layout::{Anomaly, Diagnostics, GraphEdge, GraphNode, GraphPayload, Point};

/// Merges positioned nodes and routed edges into the renderer payload.
///
/// Edges whose source or target is not in `nodes` are left out and recorded as
/// [`Anomaly::DanglingEdge`]; everything else passes through untouched.
pub fn assemble(
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    mut diagnostics: Diagnostics,
) -> GraphPayload {
    let ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();

    let mut kept = Vec::with_capacity(edges.len());
    for edge in edges {
        let missing = [&edge.source, &edge.target]
            .into_iter()
            .find(|id| !ids.contains(id.as_str()))
            .cloned();
        match missing {
            Some(missing) => {
                tracing::warn!(edge = %edge.id, %missing, "dropping edge with dangling endpoint");
                diagnostics.push(Anomaly::DanglingEdge {
                    edge: edge.id,
                    missing,
                });
            }
            None => kept.push(edge),
        }
    }

    let (origin, width, height) = bounds(&nodes, &kept);
    GraphPayload {
        nodes,
        edges: kept,
        origin,
        width,
        height,
        diagnostics,
    }
}

/// Top-left corner and size of the box holding every node and route point.
/// Positions are centers, so the corner is usually negative.
fn bounds(nodes: &[GraphNode], edges: &[GraphEdge]) -> (Point, f32, f32) {
    let corners = nodes.iter().flat_map(|node| {
        [
            Point::new(node.left(), node.top()),
            Point::new(node.right(), node.bottom()),
        ]
    });
    let route_points = edges.iter().flat_map(|edge| edge.route.iter().copied());

    let mut extent: Option<(Point, Point)> = None;
    for point in corners.chain(route_points) {
        let (min, max) = extent.get_or_insert((point, point));
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }

    match extent {
        Some((min, max)) => (min, max.x - min.x, max.y - min.y),
        None => (Point::default(), 0.0, 0.0),
    }
}
