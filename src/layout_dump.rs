use crate::layout::{
    Diagnostics, GraphPayload, MetricsSnapshot, NodeKind, Port, PortSide, Relation, Strategy,
};
use crate::status::CanonicalStatus;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// JSON shape handed to the renderer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadDump {
    pub strategy: Strategy,
    /// Top-left corner of the drawing.
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub status: CanonicalStatus,
    pub metrics: MetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub ports: Vec<PortDump>,
    /// Center.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct PortDump {
    pub id: Port,
    pub side: PortSide,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: Port,
    pub target_port: Port,
    pub relation: Relation,
    pub animated: bool,
    pub points: Vec<[f32; 2]>,
}

impl PayloadDump {
    pub fn from_payload(payload: &GraphPayload, strategy: Strategy) -> Self {
        let nodes = payload
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.kind,
                label: node.label.clone(),
                status: node.status,
                metrics: node.metrics.clone(),
                error_message: node.error_message.clone(),
                ports: node
                    .ports
                    .iter()
                    .map(|port| PortDump {
                        id: *port,
                        side: port.side(),
                    })
                    .collect(),
                x: node.position.x,
                y: node.position.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let edges = payload
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_port: edge.source_port,
                target_port: edge.target_port,
                relation: edge.relation,
                animated: edge.animated,
                points: edge.route.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        PayloadDump {
            strategy,
            min_x: payload.origin.x,
            min_y: payload.origin.y,
            width: payload.width,
            height: payload.height,
            nodes,
            edges,
            diagnostics: payload.diagnostics.clone(),
        }
    }
}

/// Writes pretty JSON to `path`, or stdout when `path` is `None` or `-`.
pub fn write_payload(
    path: Option<&Path>,
    payload: &GraphPayload,
    strategy: Strategy,
) -> anyhow::Result<()> {
    let dump = PayloadDump::from_payload(payload, strategy);
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        _ => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &dump)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_from_tree;
    use crate::config::LayoutConfig;
    use crate::ir::QueryTreeNode;
    use crate::layout::layout_with_ranks;

    #[test]
    fn dump_uses_renderer_field_names() {
        let config = LayoutConfig::default();
        let root = QueryTreeNode::new("root")
            .with_state("RUNNING")
            .with_child(QueryTreeNode::new("scan").with_state("RUNNING"));
        let payload = layout_with_ranks(build_from_tree(&root, &config), &config);
        let value = serde_json::to_value(PayloadDump::from_payload(&payload, Strategy::Ranks))
            .expect("serializable");

        assert_eq!(value["strategy"], "ranks");
        assert_eq!(value["minY"], -50.0);
        assert_eq!(value["height"], 280.0);
        assert_eq!(value["nodes"][0]["status"], "ok");
        assert_eq!(value["nodes"][0]["ports"][1]["id"], "bottom");
        assert_eq!(value["nodes"][0]["ports"][1]["side"], "SOUTH");
        assert!(value["nodes"][0].get("errorMessage").is_none());
        let edge = &value["edges"][0];
        assert_eq!(edge["sourcePort"], "bottom");
        assert_eq!(edge["targetPort"], "top");
        assert_eq!(edge["relation"], "parentChild");
        assert_eq!(edge["animated"], true);
        assert_eq!(edge["points"].as_array().map(Vec::len), Some(2));
    }
}
