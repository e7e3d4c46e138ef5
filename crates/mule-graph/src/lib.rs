//! # mule-graph
//! Annotated transaction multigraph and renderer lookups.

pub mod builder;
pub mod graph;
pub mod present;

pub use builder::{GraphDiagnostics, MergedAccount, TransactionGraphBuilder, UncanonicalAccount};
pub use graph::{AccountNode, EdgeView, NodeView, TransactionGraph, TransferEdge};
pub use present::risk_color;
