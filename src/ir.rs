use serde::{Deserialize, Serialize};

/// One stage/operator of a query execution tree as the repository returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryTreeNode {
    pub id: String,
    pub query_id: Option<String>,
    pub node_type: Option<String>,
    pub operator_type: Option<String>,
    pub source_system: Option<String>,
    pub state: Option<String>,
    pub execution_time: Option<f64>,
    pub input_rows: Option<u64>,
    pub output_rows: Option<u64>,
    pub input_bytes: Option<u64>,
    pub output_bytes: Option<u64>,
    pub cpu_time: Option<f64>,
    pub wall_time: Option<f64>,
    pub memory_bytes: Option<u64>,
    pub error_message: Option<String>,
    pub warnings: Option<Vec<String>>,
    pub children: Vec<QueryTreeNode>,
    /// Informational only; structure comes from `children`.
    pub parent_id: Option<String>,
}

impl QueryTreeNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_child(mut self, mut child: QueryTreeNode) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A point-in-time lifecycle transition. Vector order is chronological.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryEvent {
    pub query_id: Option<String>,
    pub event_type: String,
    pub timestamp: String,
    pub state: Option<String>,
    pub catalog: Option<String>,
    pub cpu_time_ms: Option<f64>,
    pub wall_time_ms: Option<f64>,
    pub queued_time_ms: Option<f64>,
    pub peak_memory_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_rows: Option<u64>,
    pub completed_splits: Option<u64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl QueryEvent {
    pub fn new(event_type: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Result of one query-repository fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryTree {
    pub query_id: Option<String>,
    pub query: Option<String>,
    pub user: Option<String>,
    pub state: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub root: Option<QueryTreeNode>,
    pub events: Vec<QueryEvent>,
}

impl QueryTree {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_payload() {
        let input = r#"{
            "queryId": "q1",
            "state": "RUNNING",
            "root": {
                "id": "root",
                "operatorType": "Output",
                "state": "RUNNING",
                "inputRows": 12,
                "children": [{ "id": "scan", "parentId": "root", "state": "FINISHED" }]
            },
            "events": [{ "eventType": "QueryCreated", "timestamp": "2024-01-01T00:00:00Z", "cpuTimeMs": 4.0 }]
        }"#;
        let tree = QueryTree::from_json(input).expect("payload should parse");
        let root = tree.root.expect("root present");
        assert_eq!(root.operator_type.as_deref(), Some("Output"));
        assert_eq!(root.input_rows, Some(12));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].parent_id.as_deref(), Some("root"));
        assert_eq!(tree.events[0].event_type, "QueryCreated");
        assert_eq!(tree.events[0].cpu_time_ms, Some(4.0));
    }

    #[test]
    fn missing_fields_default() {
        let tree = QueryTree::from_json("{}").expect("empty object parses");
        assert!(tree.root.is_none());
        assert!(tree.events.is_empty());
    }
}
