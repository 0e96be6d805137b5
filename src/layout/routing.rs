use super::{GraphNode, Point, Port};

// ── Tolerances ──────────────────────────────────────────────────────
/// Coordinates closer than this are treated as equal when compressing paths.
const POINT_EPSILON: f32 = 1e-4;

/// Axis-aligned box of a node, used to anchor ports and steer detours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl NodeBox {
    pub fn of(node: &GraphNode) -> Self {
        Self::centered(node.position, node.width, node.height)
    }

    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self {
            left: center.x - width / 2.0,
            right: center.x + width / 2.0,
            top: center.y - height / 2.0,
            bottom: center.y + height / 2.0,
        }
    }

    fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn anchor(&self, port: Port) -> Point {
        match port {
            Port::Top => Point::new(self.center_x(), self.top),
            Port::Bottom => Point::new(self.center_x(), self.bottom),
            Port::Left => Point::new(self.left, self.center_y()),
            Port::Right => Point::new(self.right, self.center_y()),
        }
    }
}

pub(super) fn side_is_vertical(port: Port) -> bool {
    matches!(port, Port::Left | Port::Right)
}

pub(super) fn port_stub_point(point: Point, port: Port, length: f32) -> Point {
    match port {
        Port::Left => Point::new(point.x - length, point.y),
        Port::Right => Point::new(point.x + length, point.y),
        Port::Top => Point::new(point.x, point.y - length),
        Port::Bottom => Point::new(point.x, point.y + length),
    }
}

/// Two-point route between the two port anchors.
pub fn straight_route(
    from: &GraphNode,
    from_port: Port,
    to: &GraphNode,
    to_port: Port,
) -> Vec<Point> {
    vec![from.port_anchor(from_port), to.port_anchor(to_port)]
}

/// Right-angle route leaving `from_port` and entering `to_port` head-on.
///
/// Forward edges (the target lies past the source along the port axis) bend
/// once through the midline between the two stubs. Backward edges detour
/// through the gap between the boxes, or around both when they overlap.
pub fn orthogonal_route(
    from_box: NodeBox,
    from_port: Port,
    to_box: NodeBox,
    to_port: Port,
    stub: f32,
) -> Vec<Point> {
    let start = from_box.anchor(from_port);
    let end = to_box.anchor(to_port);
    let a = port_stub_point(start, from_port, stub);
    let b = port_stub_point(end, to_port, stub);

    let points = match (side_is_vertical(from_port), side_is_vertical(to_port)) {
        (false, false) => {
            let forward = match from_port {
                Port::Bottom => a.y <= b.y,
                _ => a.y >= b.y,
            };
            if forward {
                let mid_y = (a.y + b.y) / 2.0;
                vec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
            } else {
                let detour_x = gap_midline(
                    (from_box.left, from_box.right),
                    (to_box.left, to_box.right),
                )
                .unwrap_or(from_box.right.max(to_box.right) + stub);
                vec![
                    start,
                    a,
                    Point::new(detour_x, a.y),
                    Point::new(detour_x, b.y),
                    b,
                    end,
                ]
            }
        }
        (true, true) => {
            let forward = match from_port {
                Port::Right => a.x <= b.x,
                _ => a.x >= b.x,
            };
            if forward {
                let mid_x = (a.x + b.x) / 2.0;
                vec![start, Point::new(mid_x, start.y), Point::new(mid_x, end.y), end]
            } else {
                let detour_y = gap_midline(
                    (from_box.top, from_box.bottom),
                    (to_box.top, to_box.bottom),
                )
                .unwrap_or(from_box.bottom.max(to_box.bottom) + stub);
                vec![
                    start,
                    a,
                    Point::new(a.x, detour_y),
                    Point::new(b.x, detour_y),
                    b,
                    end,
                ]
            }
        }
        (true, false) => vec![start, a, Point::new(b.x, a.y), b, end],
        (false, true) => vec![start, a, Point::new(a.x, b.y), b, end],
    };

    compress_path(&points)
}

/// Middle of the free band between two intervals, if they do not overlap.
fn gap_midline(a: (f32, f32), b: (f32, f32)) -> Option<f32> {
    if a.1 < b.0 {
        Some((a.1 + b.0) / 2.0)
    } else if b.1 < a.0 {
        Some((b.1 + a.0) / 2.0)
    } else {
        None
    }
}

/// Drops duplicate and collinear interior points, keeping both endpoints.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        let next = points[idx + 1];
        if same_point(prev, curr) {
            continue;
        }
        let dx1 = curr.x - prev.x;
        let dy1 = curr.y - prev.y;
        let dx2 = next.x - curr.x;
        let dy2 = next.y - curr.y;
        if (dx1.abs() <= POINT_EPSILON && dx2.abs() <= POINT_EPSILON)
            || (dy1.abs() <= POINT_EPSILON && dy2.abs() <= POINT_EPSILON)
        {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    if !same_point(last, out[out.len() - 1]) || out.len() == 1 {
        out.push(last);
    }
    out
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= POINT_EPSILON && (a.y - b.y).abs() <= POINT_EPSILON
}

pub fn path_bend_count(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for window in points.windows(3) {
        let (p0, p1, p2) = (window[0], window[1], window[2]);
        let dx1 = p1.x - p0.x;
        let dy1 = p1.y - p0.y;
        let dx2 = p2.x - p1.x;
        let dy2 = p2.y - p1.y;
        if (dx1.abs() <= POINT_EPSILON && dy1.abs() <= POINT_EPSILON)
            || (dx2.abs() <= POINT_EPSILON && dy2.abs() <= POINT_EPSILON)
        {
            continue;
        }
        let cross = dx1 * dy2 - dy1 * dx2;
        if cross.abs() > POINT_EPSILON {
            bends += 1;
        }
    }
    bends
}

pub fn is_orthogonal(points: &[Point]) -> bool {
    points.windows(2).all(|segment| {
        (segment[0].x - segment[1].x).abs() <= POINT_EPSILON
            || (segment[0].y - segment[1].y).abs() <= POINT_EPSILON
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(x: f32, y: f32) -> NodeBox {
        NodeBox::centered(Point::new(x, y), 100.0, 40.0)
    }

    #[test]
    fn aligned_parent_child_route_is_straight() {
        let parent = node_at(0.0, 0.0);
        let child = node_at(0.0, 100.0);
        let route = orthogonal_route(parent, Port::Bottom, child, Port::Top, 10.0);
        assert_eq!(route, vec![Point::new(0.0, 20.0), Point::new(0.0, 80.0)]);
    }

    #[test]
    fn offset_parent_child_route_bends_twice() {
        let parent = node_at(0.0, 0.0);
        let child = node_at(200.0, 100.0);
        let route = orthogonal_route(parent, Port::Bottom, child, Port::Top, 10.0);
        assert_eq!(
            route,
            vec![
                Point::new(0.0, 20.0),
                Point::new(0.0, 50.0),
                Point::new(200.0, 50.0),
                Point::new(200.0, 80.0),
            ]
        );
        assert_eq!(path_bend_count(&route), 2);
        assert!(is_orthogonal(&route));
    }

    #[test]
    fn backward_sequence_edge_detours_below_both_nodes() {
        let from = node_at(300.0, 0.0);
        let to = node_at(0.0, 0.0);
        let route = orthogonal_route(from, Port::Right, to, Port::Left, 10.0);
        assert!(is_orthogonal(&route));
        assert_eq!(route.first(), Some(&Point::new(350.0, 0.0)));
        assert_eq!(route.last(), Some(&Point::new(-50.0, 0.0)));
        assert!(route.iter().any(|p| p.y >= 30.0));
    }

    #[test]
    fn sequence_edge_between_stacked_nodes_stays_orthogonal() {
        let from = node_at(0.0, 0.0);
        let to = node_at(0.0, 180.0);
        let route = orthogonal_route(from, Port::Right, to, Port::Left, 10.0);
        assert!(is_orthogonal(&route));
        // crosses over in the gap between the two boxes
        assert!(route.iter().any(|p| p.y == 90.0));
    }

    #[test]
    fn compress_keeps_endpoints_of_short_paths() {
        let single = [Point::new(1.0, 1.0), Point::new(1.0, 1.0)];
        assert_eq!(compress_path(&single).len(), 2);
        let collinear = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(
            compress_path(&collinear),
            vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0)]
        );
    }
}
