//! Live node information reported by the server

use serde::Deserialize;

/// Node liveness as tracked by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum NodeStatus {
    Unknown,
    Asleep,
    Awake,
    Dead,
    Alive,
}

impl From<u8> for NodeStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => NodeStatus::Asleep,
            2 => NodeStatus::Awake,
            3 => NodeStatus::Dead,
            4 => NodeStatus::Alive,
            _ => NodeStatus::Unknown,
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeStatus::Unknown => "unknown",
            NodeStatus::Asleep => "asleep",
            NodeStatus::Awake => "awake",
            NodeStatus::Dead => "dead",
            NodeStatus::Alive => "alive",
        };
        f.write_str(s)
    }
}

/// Subset of `node.get_state` we care about
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub node_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<NodeStatus>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub label: Option<String>,
}

impl NodeSnapshot {
    /// Get a display name (name, product label, or node id)
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| format!("node {}", self.node_id))
    }

    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status.unwrap_or(NodeStatus::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_state_dump() {
        let snapshot: NodeSnapshot = serde_json::from_value(json!({
            "nodeId": 7,
            "name": "",
            "label": "ZEN71",
            "status": 3,
            "ready": true,
            "values": []
        }))
        .unwrap();
        assert_eq!(snapshot.status(), NodeStatus::Dead);
        assert_eq!(snapshot.display_name(), "ZEN71");
        assert!(snapshot.ready);
    }
}
