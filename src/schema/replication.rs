use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyspace replication strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Replication {
    SimpleStrategy { replication_factor: u32 },
    NetworkTopologyStrategy { datacenters: BTreeMap<String, u32> },
}

impl Default for Replication {
    fn default() -> Self {
        Replication::SimpleStrategy {
            replication_factor: 1,
        }
    }
}

impl Replication {
    /// CQL map literal for `WITH REPLICATION = ...`
    pub fn to_cql(&self) -> String {
        match self {
            Replication::SimpleStrategy { replication_factor } => format!(
                "{{'class':'SimpleStrategy','replication_factor':{replication_factor}}}"
            ),
            Replication::NetworkTopologyStrategy { datacenters } => {
                let mut parts = vec!["'class':'NetworkTopologyStrategy'".to_string()];
                parts.extend(datacenters.iter().map(|(dc, rf)| format!("'{dc}':{rf}")));
                format!("{{{}}}", parts.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_strategy() {
        assert_eq!(
            Replication::default().to_cql(),
            "{'class':'SimpleStrategy','replication_factor':1}"
        );
    }

    #[test]
    fn test_network_topology_strategy() {
        let r: Replication = serde_json::from_value(serde_json::json!({
            "class": "NetworkTopologyStrategy",
            "datacenters": {"dc1": 3, "dc2": 2}
        }))
        .unwrap();
        assert_eq!(
            r.to_cql(),
            "{'class':'NetworkTopologyStrategy','dc1':3,'dc2':2}"
        );
    }
}
