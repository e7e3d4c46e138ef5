//! Annotated directed multigraph of accounts and transfers.

use std::collections::HashMap;

use mule_core::types::{RiskAssessment, RiskTier, TxId};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use serde::Serialize;

/// Node payload: one account under its canonical id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountNode {
    pub id: String,
    pub cbi: f64,
    /// `None` for accounts excluded from classification.
    pub risk: Option<RiskAssessment>,
}

/// Edge payload: one transaction. Parallel transfers stay separate edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEdge {
    pub tx: TxId,
    pub amount: f64,
    /// Canonical textual timestamp (`%Y-%m-%d %H:%M:%S`).
    pub timestamp: String,
    pub fraud_label: bool,
}

/// Renderer view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeView<'a> {
    pub id: &'a str,
    pub cbi: f64,
    pub risk_tier: Option<RiskTier>,
    pub fraud_probability: Option<f64>,
}

impl<'a> From<&'a AccountNode> for NodeView<'a> {
    fn from(node: &'a AccountNode) -> Self {
        Self {
            id: &node.id,
            cbi: node.cbi,
            risk_tier: node.risk.map(|r| r.tier),
            fraud_probability: node.risk.map(|r| r.fraud_probability),
        }
    }
}

/// Renderer view of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeView<'a> {
    pub tx: TxId,
    pub source: &'a str,
    pub destination: &'a str,
    pub amount: f64,
    pub timestamp: &'a str,
    pub fraud_label: bool,
}

/// Directed multigraph keyed by canonical account id.
///
/// Built once by [`TransactionGraphBuilder`](crate::TransactionGraphBuilder)
/// and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    graph: DiGraph<AccountNode, TransferEdge>,
    index: HashMap<String, NodeIndex>,
}

impl TransactionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless its id is already present. Returns the node's index
    /// and whether it was newly inserted.
    pub(crate) fn insert_node(&mut self, node: AccountNode) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(&node.id) {
            return (idx, false);
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        (idx, true)
    }

    /// Insert an edge between two existing nodes. `None` if either endpoint is missing.
    pub(crate) fn insert_edge(
        &mut self,
        source: &str,
        destination: &str,
        edge: TransferEdge,
    ) -> Option<EdgeIndex> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(destination)?;
        Some(self.graph.add_edge(a, b, edge))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<NodeView<'_>> {
        self.index.get(id).map(|&idx| NodeView::from(&self.graph[idx]))
    }

    /// Nodes in insertion order (ascending raw account id).
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> {
        self.graph.raw_nodes().iter().map(|n| NodeView::from(&n.weight))
    }

    /// Edges in batch order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.raw_edges().iter().map(|e| EdgeView {
            tx: e.weight.tx,
            source: &self.graph[e.source()].id,
            destination: &self.graph[e.target()].id,
            amount: e.weight.amount,
            timestamp: &e.weight.timestamp,
            fraud_label: e.weight.fraud_label,
        })
    }

    /// All transfers from `source` to `destination`, one per transaction.
    pub fn edges_between<'a>(
        &'a self,
        source: &str,
        destination: &str,
    ) -> Vec<EdgeView<'a>> {
        match (self.index.get(source), self.index.get(destination)) {
            (Some(_), Some(_)) => self
                .edges()
                .filter(|e| e.source == source && e.destination == destination)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of outgoing transfers (parallel edges counted individually).
    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    /// Number of incoming transfers (parallel edges counted individually).
    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    fn degree(&self, id: &str, dir: Direction) -> usize {
        self.index
            .get(id)
            .map_or(0, |&idx| self.graph.edges_directed(idx, dir).count())
    }
}
