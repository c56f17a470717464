//! Weighting from per-paper sidecar files
//!
//! Each citing paper may have a file whose lines read
//! `cited_id \t token tfidf token tfidf ...`. Papers without a file, and
//! citations without a line, get weight 0.0.

use super::tfidf::{cosine_similarity, parse_tfidf_pairs, QueryVocabulary, SparseVector};
use super::CitationWeighter;
use crate::model::{PubId, WeightedEdge};
use async_trait::async_trait;
use futures::future::try_join_all;
use litgraph_common::config::ContextsConfig;
use litgraph_common::errors::{AppError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct SidecarContextWeighter {
    path_template: String,
    vocabulary: QueryVocabulary,
}

impl SidecarContextWeighter {
    pub fn new(path_template: impl Into<String>, vocabulary: QueryVocabulary) -> Self {
        Self {
            path_template: path_template.into(),
            vocabulary,
        }
    }

    /// Read the vocabulary file, if configured
    pub async fn load(contexts: &ContextsConfig) -> Result<Self> {
        let template = contexts
            .path_template
            .clone()
            .ok_or_else(|| AppError::config("graph.contexts.path_template is not set"))?;

        let vocabulary = match &contexts.vocabulary_path {
            Some(path) => {
                let bytes = tokio::fs::read(path).await?;
                let vocabulary = QueryVocabulary::parse(&String::from_utf8_lossy(&bytes))?;
                info!(path = %path, tokens = vocabulary.len(), "Loaded context vocabulary");
                vocabulary
            }
            None => QueryVocabulary::default(),
        };

        Ok(Self::new(template, vocabulary))
    }

    fn path_for(&self, citing: &str) -> PathBuf {
        PathBuf::from(self.path_template.replace("{id}", citing))
    }

    /// Context vectors of the wanted cited papers, from one citing file
    async fn read_contexts(
        &self,
        citing: &str,
        wanted: &HashSet<&str>,
    ) -> Result<HashMap<PubId, SparseVector>> {
        let path = self.path_for(citing);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(paper_id = %citing, path = %path.display(), "No context file");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(parse_sidecar(&String::from_utf8_lossy(&bytes), wanted))
    }
}

/// Keep the lines whose cited id is wanted; a later line for the same id wins
fn parse_sidecar(contents: &str, wanted: &HashSet<&str>) -> HashMap<PubId, SparseVector> {
    contents
        .lines()
        .filter_map(|line| {
            let (cited, rest) = line.split_once('\t')?;
            let cited = cited.trim();
            wanted
                .contains(cited)
                .then(|| (cited.to_string(), parse_tfidf_pairs(rest)))
        })
        .collect()
}

#[async_trait]
impl CitationWeighter for SidecarContextWeighter {
    async fn weigh(
        &self,
        query: &str,
        edges: Vec<(PubId, PubId)>,
    ) -> Result<Vec<WeightedEdge<PubId>>> {
        let query_vector = self.vocabulary.query_vector(query);

        let mut by_citing: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for (citing, cited) in &edges {
            by_citing.entry(citing.as_str()).or_default().insert(cited.as_str());
        }

        let contexts = try_join_all(by_citing.iter().map(|(citing, wanted)| async move {
            let found = self.read_contexts(citing, wanted).await?;
            Ok::<_, AppError>((citing.to_string(), found))
        }))
        .await?;
        let contexts: HashMap<PubId, HashMap<PubId, SparseVector>> = contexts.into_iter().collect();

        let mut missing = 0usize;
        let weighted: Vec<WeightedEdge<PubId>> = edges
            .iter()
            .map(|(citing, cited)| {
                let weight = match contexts.get(citing).and_then(|found| found.get(cited)) {
                    Some(context) => cosine_similarity(&query_vector, context),
                    None => {
                        missing += 1;
                        0.0
                    }
                };
                WeightedEdge::new(citing.clone(), cited.clone(), weight)
            })
            .collect();

        debug!(edges = weighted.len(), missing, "Weighted citations from sidecar contexts");
        Ok(weighted)
    }

    fn name(&self) -> &'static str {
        "sidecar_contexts"
    }
}
