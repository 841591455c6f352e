//! Data converter — host table rows into a graph model.
//!
//! Expects **edge-list** shaped tables: each row is one link occurrence with
//! role-named columns for its two endpoints. Nodes are merged from repeated
//! endpoint values; node identity is the endpoint cell rendered as a string,
//! which is stable for the same underlying entity across refreshes.

use bevy::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

use crate::core::graph::{LinkSpec, Node, NodeId};
use crate::core::settings::LayoutSettings;

/// Which named columns play which role in the row objects.
#[derive(Resource, Debug, Clone)]
pub struct ColumnRoles {
    pub source: String,
    pub target: String,
    /// Optional numeric link weight; absent cells count as 1.
    pub weight: String,
    /// Optional per-endpoint filter payloads, persisted when a node is clicked.
    pub source_filter: String,
    pub target_filter: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            source: "source".to_string(),
            target: "target".to_string(),
            weight: "weight".to_string(),
            source_filter: "source_filter".to_string(),
            target_filter: "target_filter".to_string(),
        }
    }
}

/// Convert rows into nodes + link specs for [`GraphModel::set_data`].
///
/// Rows missing either endpoint are skipped, never a hard failure; zero rows
/// produce zero nodes and zero links. When `layout.max_node_count` is
/// non-zero the node set is truncated in insertion order and links touching
/// truncated nodes are dropped with it.
pub fn convert(
    rows: &[Value],
    roles: &ColumnRoles,
    layout: &LayoutSettings,
) -> (Vec<Node>, Vec<LinkSpec>) {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index: HashMap<NodeId, usize> = HashMap::new();
    let mut link_weights: HashMap<(NodeId, NodeId), f32> = HashMap::new();
    let mut link_order: Vec<(NodeId, NodeId)> = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let (Some(source), Some(target)) =
            (cell_key(row, &roles.source), cell_key(row, &roles.target))
        else {
            skipped += 1;
            continue;
        };
        let weight = cell_number(row, &roles.weight).unwrap_or(1.0);

        upsert(&mut nodes, &mut index, &source, weight, cell_key(row, &roles.source_filter));
        upsert(&mut nodes, &mut index, &target, weight, cell_key(row, &roles.target_filter));

        if source != target {
            let pair = (source, target);
            match link_weights.get_mut(&pair) {
                Some(total) => *total += weight,
                None => {
                    link_weights.insert(pair.clone(), weight);
                    link_order.push(pair);
                }
            }
        }
    }

    if skipped > 0 {
        warn!("[CONVERT] skipped {} row(s) missing an endpoint", skipped);
    }

    if layout.max_node_count > 0 && nodes.len() > layout.max_node_count {
        nodes.truncate(layout.max_node_count);
        index.retain(|_, &mut i| i < nodes.len());
    }

    let links = link_order
        .into_iter()
        .filter(|(s, t)| index.contains_key(s) && index.contains_key(t))
        .map(|(source, target)| {
            let weight = link_weights.get(&(source.clone(), target.clone())).copied().unwrap_or(1.0);
            LinkSpec { source, target, weight }
        })
        .collect();

    (nodes, links)
}

fn upsert(
    nodes: &mut Vec<Node>,
    index: &mut HashMap<NodeId, usize>,
    id: &str,
    weight: f32,
    filter_key: Option<String>,
) {
    match index.get(id) {
        Some(&i) => {
            nodes[i].weight += weight;
            if nodes[i].filter_key.is_none() {
                nodes[i].filter_key = filter_key;
            }
        }
        None => {
            let mut node = Node::new(id);
            node.weight = weight;
            node.filter_key = filter_key;
            index.insert(id.to_string(), nodes.len());
            nodes.push(node);
        }
    }
}

/// Render an identity-bearing cell as a canonical string key.
/// Null/missing/object cells are not identities.
fn cell_key(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn cell_number(row: &Value, column: &str) -> Option<f32> {
    let n = row.get(column)?.as_f64()?;
    if n.is_finite() {
        Some(n as f32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roles() -> ColumnRoles {
        ColumnRoles::default()
    }

    #[test]
    fn zero_rows_produce_an_empty_graph() {
        let (nodes, links) = convert(&[], &roles(), &LayoutSettings::default());
        assert!(nodes.is_empty());
        assert!(links.is_empty());
    }

    #[test]
    fn endpoints_merge_into_nodes_with_accumulated_weight() {
        let rows = vec![
            json!({ "source": "a", "target": "b" }),
            json!({ "source": "a", "target": "c", "weight": 2.0 }),
        ];
        let (nodes, links) = convert(&rows, &roles(), &LayoutSettings::default());
        let ids: Vec<_> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(nodes[0].weight, 3.0);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn repeated_pairs_merge_into_one_link() {
        let rows = vec![
            json!({ "source": "a", "target": "b" }),
            json!({ "source": "a", "target": "b", "weight": 4.0 }),
        ];
        let (_, links) = convert(&rows, &roles(), &LayoutSettings::default());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].weight, 5.0);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let rows = vec![
            json!({ "source": "a" }),
            json!({ "target": "b" }),
            json!({ "source": null, "target": "b" }),
            json!({ "source": "", "target": "b" }),
            json!("not even an object"),
            json!({ "source": "a", "target": "b" }),
        ];
        let (nodes, links) = convert(&rows, &roles(), &LayoutSettings::default());
        assert_eq!(nodes.len(), 2);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn numeric_identities_are_stable_strings() {
        let rows = vec![json!({ "source": 1, "target": 2 })];
        let (nodes, _) = convert(&rows, &roles(), &LayoutSettings::default());
        assert_eq!(nodes[0].id, "1");
        assert_eq!(nodes[1].id, "2");
    }

    #[test]
    fn self_loops_keep_the_node_but_not_the_link() {
        let rows = vec![json!({ "source": "a", "target": "a" })];
        let (nodes, links) = convert(&rows, &roles(), &LayoutSettings::default());
        assert_eq!(nodes.len(), 1);
        assert!(links.is_empty());
    }

    #[test]
    fn max_node_count_truncates_and_drops_orphaned_links() {
        let rows = vec![
            json!({ "source": "a", "target": "b" }),
            json!({ "source": "c", "target": "d" }),
        ];
        let mut layout = LayoutSettings::default();
        layout.max_node_count = 3;
        let (nodes, links) = convert(&rows, &roles(), &layout);
        assert_eq!(nodes.len(), 3);
        // c–d lost its target; only a–b survives.
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source, "a");
    }

    #[test]
    fn filter_payload_rides_on_the_first_sighting() {
        let rows = vec![
            json!({ "source": "a", "target": "b", "source_filter": "col = 'a'" }),
            json!({ "source": "a", "target": "c", "source_filter": "other" }),
        ];
        let (nodes, _) = convert(&rows, &roles(), &LayoutSettings::default());
        assert_eq!(nodes[0].filter_key.as_deref(), Some("col = 'a'"));
        assert!(nodes[1].filter_key.is_none());
    }
}
