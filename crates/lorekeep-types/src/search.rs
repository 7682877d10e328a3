//! Collection and search types for the vector archive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five named collections in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Episodes,
    Scenes,
    Characters,
    Relationships,
    PlotEvents,
}

impl Collection {
    /// All collections, in persistence order.
    pub const ALL: [Collection; 5] = [
        Collection::Episodes,
        Collection::Scenes,
        Collection::Characters,
        Collection::Relationships,
        Collection::PlotEvents,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Collection::Episodes => "episodes",
            Collection::Scenes => "scenes",
            Collection::Characters => "characters",
            Collection::Relationships => "relationships",
            Collection::PlotEvents => "plot_events",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "episodes" => Ok(Collection::Episodes),
            "scenes" => Ok(Collection::Scenes),
            "characters" => Ok(Collection::Characters),
            "relationships" => Ok(Collection::Relationships),
            "plot_events" => Ok(Collection::PlotEvents),
            other => Err(format!("invalid collection: '{other}'")),
        }
    }
}

/// A document stored in (or read back from) a collection.
///
/// `document` is the embedded search text; `metadata` is a flat JSON object
/// carrying enough context (season/episode/scene index, names, arc tags) for
/// filtered retrieval and result formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub document: String,
    pub metadata: serde_json::Value,
}

impl DocumentEntry {
    pub fn new(id: impl Into<String>, document: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self { id: id.into(), document: document.into(), metadata }
    }

    /// Read a string metadata field, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Read a numeric metadata field, if present.
    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(|v| v.as_f64())
    }
}

/// A search hit with its similarity ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub entry: DocumentEntry,
    /// 1.0 - cosine distance; higher is more relevant.
    pub relevance_score: f32,
    /// Raw cosine distance from the query embedding.
    pub distance: f32,
}

/// Metadata filter over the indexed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchFilter {
    /// Restrict to records from one episode.
    EpisodeId(String),
    /// Restrict to plot events tagged with an arc.
    PlotArc(String),
}

impl SearchFilter {
    /// The indexed column this filter applies to.
    pub fn column(&self) -> &'static str {
        match self {
            SearchFilter::EpisodeId(_) => "episode_id",
            SearchFilter::PlotArc(_) => "plot_arc",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SearchFilter::EpisodeId(v) | SearchFilter::PlotArc(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_roundtrip() {
        for c in Collection::ALL {
            let parsed: Collection = c.to_string().parse().unwrap();
            assert_eq!(c, parsed);
        }
    }

    #[test]
    fn test_collection_serde() {
        let json = serde_json::to_string(&Collection::PlotEvents).unwrap();
        assert_eq!(json, "\"plot_events\"");
    }

    #[test]
    fn test_meta_accessors() {
        let entry = DocumentEntry::new(
            "S01E01",
            "Episode S01E01: Pilot",
            json!({"title": "Pilot", "importance_score": 0.8}),
        );
        assert_eq!(entry.meta_str("title"), Some("Pilot"));
        assert_eq!(entry.meta_f64("importance_score"), Some(0.8));
        assert_eq!(entry.meta_str("missing"), None);
    }

    #[test]
    fn test_filter_columns() {
        assert_eq!(SearchFilter::EpisodeId("S01E01".into()).column(), "episode_id");
        assert_eq!(SearchFilter::PlotArc("the heist".into()).column(), "plot_arc");
    }
}
