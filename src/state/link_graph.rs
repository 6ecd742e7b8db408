//! Directed link graph assembled during a crawl

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Adjacency {
    targets: Vec<String>,
    seen: HashSet<String>,
}

/// Source page → linked URL edges, deduplicated per source
///
/// Workers add edges concurrently; every call is serialized by an internal
/// mutex. Edges are never removed.
#[derive(Debug, Default)]
pub struct LinkGraph {
    edges: Mutex<HashMap<String, Adjacency>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records edges from `source` to every target not already recorded for it
    ///
    /// A source with no targets still appears in the graph with an empty list.
    pub fn add_edges<I, S>(&self, source: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        let adjacency = edges.entry(source.to_string()).or_default();

        for target in targets {
            let target = target.as_ref();
            if adjacency.seen.insert(target.to_string()) {
                adjacency.targets.push(target.to_string());
            }
        }
    }

    /// Returns a snapshot of every edge, keyed by source in sorted order
    ///
    /// Targets keep the order they were first recorded in.
    pub fn get_all_edges(&self) -> BTreeMap<String, Vec<String>> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        edges
            .iter()
            .map(|(source, adjacency)| (source.clone(), adjacency.targets.clone()))
            .collect()
    }

    /// Returns the targets recorded for a source
    pub fn targets(&self, source: &str) -> Vec<String> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        edges
            .get(source)
            .map(|adjacency| adjacency.targets.clone())
            .unwrap_or_default()
    }

    /// Number of source pages in the graph
    pub fn source_count(&self) -> usize {
        self.edges.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        edges.values().map(|adjacency| adjacency.targets.len()).sum()
    }
}
