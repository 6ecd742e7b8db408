//! JSON export of crawl results and the link graph

use crate::state::{LinkGraph, PageResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the page results as a pretty-printed JSON array
pub fn write_results<W: Write>(writer: W, results: &[PageResult]) -> crate::Result<()> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

/// Writes the link graph as a JSON object `{source: [targets]}`
///
/// Sources are sorted; targets keep discovery order.
pub fn write_link_graph<W: Write>(writer: W, graph: &LinkGraph) -> crate::Result<()> {
    serde_json::to_writer_pretty(writer, &graph.get_all_edges())?;
    Ok(())
}

/// Exports the page results to a JSON file
///
/// # Arguments
///
/// * `results` - The crawled pages
/// * `path` - Destination file (created or truncated)
pub fn export_results(results: &[PageResult], path: &Path) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_results(&mut writer, results)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), pages = results.len(), "Wrote results");
    Ok(())
}

/// Exports the link graph to a JSON file
pub fn export_link_graph(graph: &LinkGraph, path: &Path) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_link_graph(&mut writer, graph)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), edges = graph.edge_count(), "Wrote link graph");
    Ok(())
}
