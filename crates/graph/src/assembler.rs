//! Merging the layers into one directed graph
//!
//! Node indices are dense and assigned in layer order: publications, authors,
//! keywords, venues, then topics. Citation edges keep their direction; every
//! other relation is stored as two opposite edges with the same weight,
//! except directional co-occurrence rules which are stored once.

use crate::attributes::{Attributes, LayerAttributes};
use crate::layers::{AuthorLayer, KeywordLayer, PublicationLayer, TopicLayer, VenueLayer};
use crate::model::{AuthorId, Keyword, NodeKind, PubId, TopicId, VenueId, WeightedEdge};
use crate::snapshot::CorpusSnapshot;
use litgraph_common::errors::{AppError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use tracing::debug;

/// Node payload of the unified graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub kind: NodeKind,
    pub entity_id: String,

    /// Publication year, `0` when unknown; publications only
    pub year: Option<i32>,

    /// Query relevance, `0.0` when unknown; publications only
    pub query_score: Option<f64>,

    pub attributes: Attributes,
}

impl GraphNode {
    fn new(kind: NodeKind, entity_id: impl ToString) -> Self {
        Self {
            kind,
            entity_id: entity_id.to_string(),
            year: None,
            query_score: None,
            attributes: Attributes::new(),
        }
    }

    /// `label` attribute, falling back to the entity id
    pub fn label(&self) -> String {
        self.attributes
            .get("label")
            .map(|v| v.to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| self.entity_id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub weight: f64,
}

/// Every layer of one build
#[derive(Debug, Clone)]
pub struct GraphLayers {
    pub publications: PublicationLayer,
    pub authors: AuthorLayer,
    pub keywords: KeywordLayer,
    pub venues: VenueLayer,
    pub topics: Option<TopicLayer>,
}

/// The unified relevance graph
#[derive(Debug, Clone, Default)]
pub struct RelevanceGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    publications: HashMap<PubId, NodeIndex>,
    authors: HashMap<AuthorId, NodeIndex>,
    keywords: HashMap<Keyword, NodeIndex>,
    venues: HashMap<VenueId, NodeIndex>,
    topics: HashMap<TopicId, NodeIndex>,
}

impl RelevanceGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(index)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    /// `(source, target, weight)` for every edge
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target(), edge.weight().weight))
    }

    pub fn edge_weight(&self, source: NodeIndex, target: NodeIndex) -> Option<f64> {
        self.graph
            .find_edge(source, target)
            .and_then(|edge| self.graph.edge_weight(edge))
            .map(|edge| edge.weight)
    }

    pub fn publication(&self, id: &str) -> Option<NodeIndex> {
        self.publications.get(id).copied()
    }

    pub fn author(&self, id: AuthorId) -> Option<NodeIndex> {
        self.authors.get(&id).copied()
    }

    pub fn keyword(&self, keyword: &str) -> Option<NodeIndex> {
        self.keywords.get(keyword).copied()
    }

    pub fn venue(&self, id: VenueId) -> Option<NodeIndex> {
        self.venues.get(&id).copied()
    }

    pub fn topic(&self, id: TopicId) -> Option<NodeIndex> {
        self.topics.get(&id).copied()
    }

    /// Number of nodes of one kind
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.graph.node_weights().filter(|node| node.kind == kind).count()
    }

    /// The underlying petgraph
    pub fn as_petgraph(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }
}

/// Add nodes once per distinct entity, in order
fn add_nodes<K, F>(
    graph: &mut DiGraph<GraphNode, GraphEdge>,
    entities: &[K],
    mut make: F,
) -> HashMap<K, NodeIndex>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> GraphNode,
{
    let mut ids = HashMap::with_capacity(entities.len());
    for entity in entities {
        if !ids.contains_key(entity) {
            let index = graph.add_node(make(entity));
            ids.insert(entity.clone(), index);
        }
    }
    ids
}

fn endpoint<K>(ids: &HashMap<K, NodeIndex>, layer: &'static str, entity: &K) -> Result<NodeIndex>
where
    K: Eq + Hash + Display,
{
    ids.get(entity).copied().ok_or_else(|| AppError::DanglingEdge {
        layer: layer.to_string(),
        entity: entity.to_string(),
    })
}

/// Insert `edges`, in both directions when `symmetric`. Re-inserting an
/// existing pair replaces its weight.
fn link<S, T>(
    graph: &mut DiGraph<GraphNode, GraphEdge>,
    layer: &'static str,
    edges: &[WeightedEdge<S, T>],
    sources: &HashMap<S, NodeIndex>,
    targets: &HashMap<T, NodeIndex>,
    symmetric: bool,
) -> Result<()>
where
    S: Eq + Hash + Display,
    T: Eq + Hash + Display,
{
    for edge in edges {
        let source = endpoint(sources, layer, &edge.source)?;
        let target = endpoint(targets, layer, &edge.target)?;
        let weight = GraphEdge { weight: edge.weight };

        graph.update_edge(source, target, weight);
        if symmetric {
            graph.update_edge(target, source, weight);
        }
    }
    Ok(())
}

fn with_attributes<K: Eq + Hash>(
    mut node: GraphNode,
    attributes: Option<&HashMap<K, Attributes>>,
    entity: &K,
) -> GraphNode {
    if let Some(atts) = attributes.and_then(|all| all.get(entity)) {
        node.attributes = atts.clone();
    }
    node
}

/// Merge the layers into one graph
pub fn assemble(
    layers: &GraphLayers,
    snapshot: &CorpusSnapshot,
    attributes: Option<&LayerAttributes>,
) -> Result<RelevanceGraph> {
    let mut graph = DiGraph::new();

    let pubs = &layers.publications;
    let publications = add_nodes(&mut graph, &pubs.nodes, |id: &PubId| {
        let mut node = GraphNode::new(NodeKind::Publication, id);
        node.year = Some(snapshot.year(id));
        node.query_score = Some(pubs.query_score(id));
        with_attributes(node, attributes.map(|a| &a.publications), id)
    });
    link(&mut graph, "citations", &pubs.citations, &publications, &publications, false)?;

    let authors = add_nodes(&mut graph, &layers.authors.nodes, |id: &AuthorId| {
        with_attributes(
            GraphNode::new(NodeKind::Author, id),
            attributes.map(|a| &a.authors),
            id,
        )
    });
    link(&mut graph, "coauthorship", &layers.authors.coauthorships, &authors, &authors, true)?;
    link(&mut graph, "authorship", &layers.authors.authorships, &publications, &authors, true)?;

    let kws = &layers.keywords;
    let keywords = add_nodes(&mut graph, &kws.nodes, |kw: &Keyword| {
        with_attributes(
            GraphNode::new(NodeKind::Keyword, kw),
            attributes.map(|a| &a.keywords),
            kw,
        )
    });
    link(&mut graph, "keyword_cooccurrence", &kws.cooccurrences, &keywords, &keywords, kws.is_symmetric())?;
    link(&mut graph, "keyword_mention", &kws.memberships, &publications, &keywords, true)?;

    let venues = add_nodes(&mut graph, &layers.venues.nodes, |id: &VenueId| {
        with_attributes(
            GraphNode::new(NodeKind::Venue, id),
            attributes.map(|a| &a.venues),
            id,
        )
    });
    link(&mut graph, "venue", &layers.venues.placements, &publications, &venues, true)?;

    let mut topics = HashMap::new();
    if let Some(layer) = &layers.topics {
        topics = add_nodes(&mut graph, &layer.nodes, |id: &TopicId| {
            with_attributes(
                GraphNode::new(NodeKind::Topic, id),
                attributes.map(|a| &a.topics),
                id,
            )
        });
        link(&mut graph, "topic_correlation", &layer.cooccurrences, &topics, &topics, layer.is_symmetric())?;
        link(&mut graph, "topic_share", &layer.memberships, &publications, &topics, true)?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Graph assembled"
    );

    Ok(RelevanceGraph {
        graph,
        publications,
        authors,
        keywords,
        venues,
        topics,
    })
}
