//! Serializing a relevance graph
//!
//! - GEXF 1.2 for graph tools
//! - node-link JSON for web clients

use crate::assembler::{GraphNode, RelevanceGraph};
use crate::attributes::{AttributeValue, Attributes};
use crate::model::NodeKind;
use litgraph_common::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Output format of an exported graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Gexf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Gexf => "gexf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Gexf => "application/gexf+xml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_score: Option<f64>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Node-link document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub nodes: Vec<NodeLinkNode>,
    pub links: Vec<NodeLinkEdge>,
}

pub fn to_node_link(graph: &RelevanceGraph) -> NodeLinkGraph {
    let nodes = graph
        .nodes()
        .map(|(index, node)| NodeLinkNode {
            id: index.index(),
            kind: node.kind,
            entity_id: node.entity_id.clone(),
            year: node.year,
            query_score: node.query_score,
            attributes: node.attributes.clone(),
        })
        .collect();

    let links = graph
        .edges()
        .map(|(source, target, weight)| NodeLinkEdge {
            source: source.index(),
            target: target.index(),
            weight,
        })
        .collect();

    NodeLinkGraph {
        directed: true,
        nodes,
        links,
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn gexf_type(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::Int(_) => "long",
        AttributeValue::Float(_) => "double",
        AttributeValue::Text(_) => "string",
    }
}

/// Declared node attribute columns: the fixed ones, then every optional key
/// in name order, typed by its first value
fn attribute_columns(graph: &RelevanceGraph) -> Vec<(String, &'static str)> {
    let mut optional: BTreeMap<&str, &'static str> = BTreeMap::new();
    for (_, node) in graph.nodes() {
        for (key, value) in &node.attributes {
            optional.entry(key.as_str()).or_insert_with(|| gexf_type(value));
        }
    }

    let mut columns: Vec<(String, &'static str)> = vec![
        ("type".to_string(), "string"),
        ("entity_id".to_string(), "string"),
        ("year".to_string(), "integer"),
        ("query_score".to_string(), "double"),
    ];
    columns.extend(
        optional
            .into_iter()
            .filter(|(key, _)| !matches!(*key, "type" | "entity_id" | "year" | "query_score"))
            .map(|(key, kind)| (key.to_string(), kind)),
    );
    columns
}

fn node_values(node: &GraphNode, columns: &[(String, &'static str)]) -> Vec<(usize, String)> {
    let mut values = vec![(0, node.kind.as_str().to_string()), (1, node.entity_id.clone())];
    if let Some(year) = node.year {
        values.push((2, year.to_string()));
    }
    if let Some(score) = node.query_score {
        values.push((3, score.to_string()));
    }
    for (column, (key, _)) in columns.iter().enumerate().skip(4) {
        if let Some(value) = node.attributes.get(key) {
            values.push((column, value.to_string()));
        }
    }
    values
}

/// GEXF 1.2 document of a directed weighted graph
pub fn to_gexf(graph: &RelevanceGraph) -> String {
    let columns = attribute_columns(graph);
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">"#
    );
    let _ = writeln!(
        out,
        r#"  <meta lastmodifieddate="{}"><creator>litgraph</creator></meta>"#,
        chrono::Utc::now().format("%Y-%m-%d")
    );
    let _ = writeln!(out, r#"  <graph mode="static" defaultedgetype="directed">"#);

    let _ = writeln!(out, r#"    <attributes class="node">"#);
    for (id, (title, kind)) in columns.iter().enumerate() {
        let _ = writeln!(
            out,
            r#"      <attribute id="{}" title="{}" type="{}"/>"#,
            id,
            escape_xml(title),
            kind
        );
    }
    let _ = writeln!(out, "    </attributes>");

    let _ = writeln!(out, "    <nodes>");
    for (index, node) in graph.nodes() {
        let _ = writeln!(
            out,
            r#"      <node id="{}" label="{}">"#,
            index.index(),
            escape_xml(&node.label())
        );
        let _ = writeln!(out, "        <attvalues>");
        for (column, value) in node_values(node, &columns) {
            let _ = writeln!(
                out,
                r#"          <attvalue for="{}" value="{}"/>"#,
                column,
                escape_xml(&value)
            );
        }
        let _ = writeln!(out, "        </attvalues>");
        let _ = writeln!(out, "      </node>");
    }
    let _ = writeln!(out, "    </nodes>");

    let _ = writeln!(out, "    <edges>");
    for (id, (source, target, weight)) in graph.edges().enumerate() {
        let _ = writeln!(
            out,
            r#"      <edge id="{}" source="{}" target="{}" weight="{}"/>"#,
            id,
            source.index(),
            target.index(),
            weight
        );
    }
    let _ = writeln!(out, "    </edges>");
    let _ = writeln!(out, "  </graph>");
    let _ = writeln!(out, "</gexf>");

    out
}

/// Render in the requested format
pub fn render(graph: &RelevanceGraph, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string(&to_node_link(graph))?),
        ExportFormat::Gexf => Ok(to_gexf(graph)),
    }
}

/// Write the graph to `path`
pub async fn write_graph(
    graph: &RelevanceGraph,
    path: impl AsRef<Path>,
    format: ExportFormat,
) -> Result<()> {
    let path = path.as_ref();
    let rendered = render(graph, format)?;
    tokio::fs::write(path, rendered).await?;

    info!(
        path = %path.display(),
        format = format.as_str(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Graph written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyIndex;
    use crate::assembler::{assemble, GraphLayers};
    use crate::attributes::LayerAttributes;
    use crate::layers::{AuthorLayer, CooccurrenceLayer, PublicationLayer, VenueLayer};
    use crate::model::WeightedEdge;
    use crate::snapshot::CorpusSnapshot;
    use litgraph_common::config::CooccurrenceStatistic;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn graph() -> RelevanceGraph {
        let layers = GraphLayers {
            publications: PublicationLayer {
                nodes: vec!["p1".into(), "p2".into()],
                citations: vec![WeightedEdge::new("p1".into(), "p2".into(), 0.5)],
                query_scores: HashMap::from([("p1".to_string(), 1.5)]),
            },
            authors: AuthorLayer {
                nodes: vec![7],
                coauthorships: vec![],
                authorships: vec![WeightedEdge::new("p1".into(), 7, 1.0)],
            },
            keywords: CooccurrenceLayer {
                nodes: vec![],
                cooccurrences: vec![],
                memberships: vec![],
                statistic: CooccurrenceStatistic::Lift,
            },
            venues: VenueLayer::default(),
            topics: None,
        };

        let mut atts = LayerAttributes::default();
        atts.publications.insert(
            "p1".into(),
            Attributes::from([("label".to_string(), "Graphs & <Ranking>".into())]),
        );
        atts.authors.insert(7, Attributes::from([("npapers".to_string(), 3i64.into())]));

        let snapshot = CorpusSnapshot::new(
            AdjacencyIndex::new(),
            HashMap::from([("p1".to_string(), 2001)]),
            HashMap::new(),
        );
        assemble(&layers, &snapshot, Some(&atts)).unwrap()
    }

    #[test]
    fn test_node_link() {
        let doc = to_node_link(&graph());
        assert!(doc.directed);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.links.len(), 3);
        assert_eq!(doc.links[0], NodeLinkEdge { source: 0, target: 1, weight: 0.5 });

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["nodes"][0]["type"], "publication");
        assert_eq!(json["nodes"][0]["year"], 2001);
        assert_eq!(json["nodes"][0]["label"], "Graphs & <Ranking>");
        assert_eq!(json["nodes"][2]["npapers"], 3);
        assert!(json["nodes"][2].get("year").is_none());
    }

    #[test]
    fn test_gexf() {
        let gexf = to_gexf(&graph());
        assert!(gexf.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(gexf.contains(r#"defaultedgetype="directed""#));
        assert!(gexf.contains(r#"<node id="0" label="Graphs &amp; &lt;Ranking&gt;">"#));
        assert!(gexf.contains(r#"<node id="1" label="p2">"#));
        assert!(gexf.contains(r#"<attribute id="5" title="npapers" type="long"/>"#));
        assert!(gexf.contains(r#"<edge id="0" source="0" target="1" weight="0.5"/>"#));
        assert_eq!(gexf.matches("<edge ").count(), 3);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a "b" & 'c'"#), "a &quot;b&quot; &amp; &apos;c&apos;");
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }

    #[tokio::test]
    async fn test_write_graph() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        write_graph(&graph(), &path, ExportFormat::Json).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: NodeLinkGraph = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.nodes.len(), 3);
    }
}
