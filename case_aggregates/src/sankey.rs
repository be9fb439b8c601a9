use indexmap::IndexMap;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::*;

/// The name of the node all the flows start from.
pub const ROOT_NODE_NAME: &str = "All Cases";

// Nodes are identified by key while the graph is built. The root has its own
// key, so an issue that happens to be called "All Cases" is a separate node.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
enum NodeKey {
    Root,
    Issue(String),
}

impl NodeKey {
    fn name(&self) -> &str {
        match self {
            NodeKey::Root => ROOT_NODE_NAME,
            NodeKey::Issue(s) => s.as_str(),
        }
    }
}

/// Builds the flow graph: the root node fans out to one node per issue, and
/// every (issue, year) pair gets one link carrying the running total of the
/// issue up to that year.
///
/// Issues appear in the order they are first seen. Links are grouped by issue,
/// and sorted by year within an issue. Use `SankeyGraph::links_for_year` to
/// replay the graph year by year.
pub fn aggregate_for_sankey(records: &[CanonicalRecord]) -> SankeyGraph {
    let mut per_node: IndexMap<NodeKey, BTreeMap<i32, u64>> = IndexMap::new();
    per_node.insert(NodeKey::Root, BTreeMap::new());

    for r in records {
        let counts = per_node
            .entry(NodeKey::Issue(r.issue_name().to_string()))
            .or_default();
        *counts.entry(r.year()).or_insert(0) += 1;
    }
    debug!("aggregate_for_sankey: {} nodes", per_node.len());

    // Positions are only assigned here.
    let nodes: Vec<SankeyNode> = per_node
        .keys()
        .map(|k| SankeyNode {
            name: k.name().to_string(),
        })
        .collect();
    let root_idx = per_node.get_index_of(&NodeKey::Root).unwrap_or(0);

    let mut links: Vec<SankeyLink> = Vec::new();
    for (target, (key, counts)) in per_node.iter().enumerate() {
        if *key == NodeKey::Root {
            continue;
        }
        let mut total: u64 = 0;
        for (year, count) in counts.iter() {
            total += count;
            links.push(SankeyLink {
                source: root_idx,
                target,
                value: total,
                year: *year,
            });
        }
    }

    SankeyGraph { nodes, links }
}

impl SankeyGraph {
    /// The distinct years of the links, in increasing order.
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.links.iter().map(|l| l.year).collect();
        years.into_iter().collect()
    }

    /// All the links of one year, across issues, in graph order.
    pub fn links_for_year(&self, year: i32) -> Vec<&SankeyLink> {
        self.links.iter().filter(|l| l.year == year).collect()
    }

    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.name.as_str())
    }

    /// Checks that the renderers can draw this graph: the root node comes
    /// first, links refer to existing nodes, and the values of each target do
    /// not decrease over the years.
    pub fn validate(&self) -> Result<(), SankeyCheckError> {
        match self.nodes.first() {
            Some(n) if n.name == ROOT_NODE_NAME => {}
            _ => return Err(SankeyCheckError::MissingRootNode),
        }

        let mut per_target: HashMap<usize, Vec<(i32, u64)>> = HashMap::new();
        for (idx, l) in self.links.iter().enumerate() {
            for index in [l.source, l.target] {
                if index >= self.nodes.len() {
                    return Err(SankeyCheckError::LinkOutOfRange { link: idx, index });
                }
            }
            per_target
                .entry(l.target)
                .or_default()
                .push((l.year, l.value));
        }

        let mut targets: Vec<usize> = per_target.keys().cloned().collect();
        targets.sort_unstable();
        for target in targets {
            let mut values = per_target.remove(&target).unwrap_or_default();
            values.sort_by_key(|p| p.0);
            for pair in values.windows(2) {
                let (_, previous) = pair[0];
                let (year, value) = pair[1];
                if value < previous {
                    return Err(SankeyCheckError::NonMonotonic {
                        target: self.nodes[target].name.clone(),
                        year,
                        value,
                        previous,
                    });
                }
            }
        }
        Ok(())
    }
}
