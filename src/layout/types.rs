use serde::{Deserialize, Serialize};

use crate::status::CanonicalStatus;

use super::NodeBox;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Tree,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortSide {
    North,
    South,
    West,
    East,
}

impl Port {
    pub const ALL: [Port; 4] = [Port::Top, Port::Bottom, Port::Left, Port::Right];

    pub fn side(self) -> PortSide {
        match self {
            Port::Top => PortSide::North,
            Port::Bottom => PortSide::South,
            Port::Left => PortSide::West,
            Port::Right => PortSide::East,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Port::Top => "top",
            Port::Bottom => "bottom",
            Port::Left => "left",
            Port::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    ParentChild,
    Sequence,
}

impl Relation {
    pub fn ports(self) -> (Port, Port) {
        match self {
            Relation::ParentChild => (Port::Bottom, Port::Top),
            Relation::Sequence => (Port::Right, Port::Left),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::ParentChild => "parentChild",
            Relation::Sequence => "sequence",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub execution_time: Option<f64>,
    pub input_rows: Option<u64>,
    pub output_rows: Option<u64>,
    pub input_bytes: Option<u64>,
    pub output_bytes: Option<u64>,
    pub cpu_time: Option<f64>,
    pub wall_time: Option<f64>,
    pub memory_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub status: CanonicalStatus,
    pub metrics: MetricsSnapshot,
    pub error_message: Option<String>,
    pub ports: [Port; 4],
    pub width: f32,
    pub height: f32,
    /// Center of the node box.
    pub position: Point,
}

impl GraphNode {
    pub fn left(&self) -> f32 {
        self.position.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.position.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.height / 2.0
    }

    pub fn port_anchor(&self, port: Port) -> Point {
        NodeBox::of(self).anchor(port)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: Port,
    pub target_port: Port,
    pub relation: Relation,
    pub animated: bool,
    pub route: Vec<Point>,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str, relation: Relation) -> Self {
        let (source_port, target_port) = relation.ports();
        Self {
            id: edge_id(source, relation, target),
            source: source.to_string(),
            target: target.to_string(),
            source_port,
            target_port,
            relation,
            animated: false,
            route: Vec::new(),
        }
    }
}

pub fn edge_id(source: &str, relation: Relation, target: &str) -> String {
    format!("{source}:{}:{target}", relation.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    DuplicateNode { id: String, parent: Option<String> },
    SelfEdge { id: String },
    DanglingEdge { edge: String, missing: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn push(&mut self, anomaly: Anomaly) {
        tracing::debug!(?anomaly, "graph anomaly recovered");
        self.anomalies.push(anomaly);
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub diagnostics: Diagnostics,
}

impl CanonicalGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Top-left corner of the drawing; `width` and `height` extend from here.
    pub origin: Point,
    pub width: f32,
    pub height: f32,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Ranks,
    Layered,
}
