//! Character relationship graph.
//!
//! Thin layer over petgraph: characters are nodes, relationships are
//! weighted undirected edges.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use lorekeep_types::error::StorageError;
use lorekeep_types::search::Collection;

use crate::archive::SeriesArchive;

/// Edge payload: relationship type plus importance weight.
#[derive(Debug, Clone)]
pub struct RelationshipEdge {
    pub relationship_type: String,
    pub importance: f32,
}

/// Undirected character relationship graph.
pub struct RelationshipGraph {
    graph: UnGraph<String, RelationshipEdge>,
}

impl RelationshipGraph {
    pub fn graph(&self) -> &UnGraph<String, RelationshipEdge> {
        &self.graph
    }

    pub fn character_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Characters ranked by connection count, descending.
    pub fn most_connected(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .graph
            .node_indices()
            .map(|idx| (self.graph[idx].clone(), self.graph.neighbors(idx).count()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Build the relationship graph from every stored relationship.
pub async fn build_relationship_graph(
    archive: &SeriesArchive,
) -> Result<RelationshipGraph, StorageError> {
    let entries = archive.scan(Collection::Relationships, None, usize::MAX).await?;

    let mut graph: UnGraph<String, RelationshipEdge> = UnGraph::new_undirected();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

    for entry in entries {
        let (Some(char1), Some(char2)) = (entry.meta_str("character1"), entry.meta_str("character2"))
        else {
            continue;
        };
        let relationship_type = entry.meta_str("relationship_type").unwrap_or("unknown").to_string();
        let importance = entry.meta_f64("importance_score").unwrap_or(0.5) as f32;

        let a = *nodes
            .entry(char1.to_string())
            .or_insert_with(|| graph.add_node(char1.to_string()));
        let b = *nodes
            .entry(char2.to_string())
            .or_insert_with(|| graph.add_node(char2.to_string()));
        graph.add_edge(a, b, RelationshipEdge { relationship_type, importance });
    }

    Ok(RelationshipGraph { graph })
}
