//! Read-only query facade over the archive.

pub mod graph;
pub mod interface;

pub use graph::{build_relationship_graph, RelationshipGraph};
pub use interface::QueryInterface;
