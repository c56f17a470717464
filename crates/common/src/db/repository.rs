//! Repository over the corpus schema
//!
//! Read-only access to the tables the graph engine consumes:
//! `graph` (citations and their contexts), `papers`, `authorships`,
//! `coauthorships`, `authors`, `venues`, `doc_ngrams`, `doc_kws`,
//! `doc_topics` and `topic_words`. Every query decodes into a typed row.

use crate::config::KeywordMode;
use crate::db::rows::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement, Value};
use tracing::debug;

/// Columns of `papers` that may be matched against a query
pub const SEARCHABLE_FIELDS: &[&str] = &["title", "abstract"];

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    fn statement(sql: &str, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }

    fn doc_ngrams_statement(paper_ids: &[String], min_value: f64) -> Statement {
        let sql = r#"
            SELECT paper_id::text AS paper_id, ngram AS item, value::float8 AS value
            FROM doc_ngrams
            WHERE paper_id::text = ANY($1) AND value >= $2
        "#;
        Self::statement(sql, vec![text_array(paper_ids), min_value.into()])
    }

    fn paper_attributes_statement(paper_ids: &[String]) -> Statement {
        let sql = r#"
            SELECT id::text AS id, title, venue
            FROM papers
            WHERE id::text = ANY($1)
        "#;
        Self::statement(sql, vec![text_array(paper_ids)])
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Snapshot Loading
    // ========================================================================

    /// The full citation relation
    pub async fn citation_edges(&self) -> Result<Vec<CitationRow>> {
        let sql = r#"
            SELECT citing::text AS citing, cited::text AS cited
            FROM graph
        "#;

        let rows = CitationRow::find_by_statement(Self::statement(sql, vec![]))
            .all(self.conn())
            .await?;

        debug!(edges = rows.len(), "Loaded citation relation");
        Ok(rows)
    }

    /// Year and venue of every publication
    pub async fn publication_facts(&self) -> Result<Vec<PublicationFactsRow>> {
        let sql = r#"
            SELECT id::text AS id, year::int4 AS year, venue_id::int8 AS venue_id
            FROM papers
        "#;

        PublicationFactsRow::find_by_statement(Self::statement(sql, vec![]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Authors
    // ========================================================================

    /// Authors of a paper
    pub async fn authors_of_paper(&self, paper_id: &str) -> Result<Vec<AuthorshipRow>> {
        let sql = r#"
            SELECT paper_id::text AS paper_id, author_id::int8 AS author_id
            FROM authorships
            WHERE paper_id::text = $1
        "#;

        AuthorshipRow::find_by_statement(Self::statement(sql, vec![paper_id.into()]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Pre-aggregated co-authorship counts involving an author
    pub async fn coauthorships_of(&self, author_id: i64) -> Result<Vec<CoauthorshipRow>> {
        let sql = r#"
            SELECT author1::int8 AS author1, author2::int8 AS author2, npapers::int8 AS npapers
            FROM coauthorships
            WHERE author1 = $1 OR author2 = $1
        "#;

        CoauthorshipRow::find_by_statement(Self::statement(sql, vec![author_id.into()]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// One row per (co-author, shared paper) of an author
    pub async fn shared_paper_coauthors(&self, author_id: i64) -> Result<Vec<SharedPaperRow>> {
        let sql = r#"
            SELECT b.author_id::int8 AS coauthor_id
            FROM authorships a
            JOIN authorships b ON a.paper_id = b.paper_id
            WHERE a.author_id = $1 AND b.author_id <> $1
        "#;

        SharedPaperRow::find_by_statement(Self::statement(sql, vec![author_id.into()]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Keywords, N-grams and Topics
    // ========================================================================

    /// Statistical n-grams with a TF-IDF of at least `min_value`
    pub async fn doc_ngrams(&self, paper_ids: &[String], min_value: f64) -> Result<Vec<DocItemRow>> {
        if paper_ids.is_empty() {
            return Ok(vec![]);
        }

        DocItemRow::find_by_statement(Self::doc_ngrams_statement(paper_ids, min_value))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Keywords of the given papers, filtered by mode
    pub async fn doc_keywords(
        &self,
        paper_ids: &[String],
        mode: KeywordMode,
        min_value: f64,
    ) -> Result<Vec<DocItemRow>> {
        if paper_ids.is_empty() {
            return Ok(vec![]);
        }

        let filter = match mode {
            KeywordMode::Extracted => "AND extracted = 1",
            KeywordMode::Extended => "AND extracted = 0 AND value >= $2",
            KeywordMode::Both => "AND value >= $2",
            KeywordMode::Ngrams => {
                return Err(AppError::config(
                    "n-gram mode reads doc_ngrams, not doc_kws",
                ))
            }
        };

        let sql = format!(
            r#"
            SELECT paper_id::text AS paper_id, ngram AS item, value::float8 AS value
            FROM doc_kws
            WHERE paper_id::text = ANY($1) {}
            "#,
            filter
        );

        let mut values = vec![text_array(paper_ids)];
        if mode != KeywordMode::Extracted {
            values.push(min_value.into());
        }

        DocItemRow::find_by_statement(Self::statement(&sql, values))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Topic shares of a paper
    pub async fn doc_topics(&self, paper_id: &str) -> Result<Vec<DocTopicRow>> {
        let sql = r#"
            SELECT paper_id::text AS paper_id, topic_id::int4 AS topic_id, value::float8 AS value
            FROM doc_topics
            WHERE paper_id::text = $1
        "#;

        DocTopicRow::find_by_statement(Self::statement(sql, vec![paper_id.into()]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Citation Contexts
    // ========================================================================

    /// Text surrounding a citation, if recorded
    pub async fn citation_context(&self, citing: &str, cited: &str) -> Result<Option<CitationContextRow>> {
        let sql = r#"
            SELECT citing::text AS citing, cited::text AS cited, context
            FROM graph
            WHERE citing::text = $1 AND cited::text = $2
            LIMIT 1
        "#;

        CitationContextRow::find_by_statement(Self::statement(sql, vec![citing.into(), cited.into()]))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Display Attributes
    // ========================================================================

    pub async fn paper_attributes(&self, paper_ids: &[String]) -> Result<Vec<PaperAttributesRow>> {
        if paper_ids.is_empty() {
            return Ok(vec![]);
        }

        PaperAttributesRow::find_by_statement(Self::paper_attributes_statement(paper_ids))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn author_attributes(&self, author_ids: &[i64]) -> Result<Vec<AuthorAttributesRow>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        let sql = r#"
            SELECT cluster::int8 AS id,
                   MAX(name) AS name,
                   MAX(email) AS email,
                   MAX(affil) AS affil,
                   COUNT(*)::int8 AS npapers
            FROM authors
            WHERE cluster::int8 = ANY($1)
            GROUP BY cluster
        "#;

        AuthorAttributesRow::find_by_statement(Self::statement(sql, vec![int_array(author_ids)]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn venue_attributes(&self, venue_ids: &[i64]) -> Result<Vec<VenueAttributesRow>> {
        if venue_ids.is_empty() {
            return Ok(vec![]);
        }

        let sql = r#"
            SELECT id::int8 AS id, name
            FROM venues
            WHERE id::int8 = ANY($1)
        "#;

        VenueAttributesRow::find_by_statement(Self::statement(sql, vec![int_array(venue_ids)]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn topic_labels(&self) -> Result<Vec<TopicLabelRow>> {
        let sql = r#"
            SELECT topic_id::int4 AS topic_id, words
            FROM topic_words
            ORDER BY topic_id
        "#;

        TopicLabelRow::find_by_statement(Self::statement(sql, vec![]))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Full-text Search
    // ========================================================================

    /// Top papers for a query, skipping `exclude`
    pub async fn search_papers(
        &self,
        query: &str,
        fields: &[String],
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredPaperRow>> {
        let vector = text_vector(fields)?;

        let exclusion = if exclude.is_empty() {
            String::new()
        } else {
            "AND id::text <> ALL($3)".to_string()
        };

        let sql = format!(
            r#"
            SELECT id::text AS id,
                   ts_rank_cd({vector}, plainto_tsquery('english', $1))::float8 AS score
            FROM papers
            WHERE {vector} @@ plainto_tsquery('english', $1)
            {exclusion}
            ORDER BY score DESC
            LIMIT $2
            "#
        );

        let mut values: Vec<Value> = vec![query.into(), (limit as i64).into()];
        if !exclude.is_empty() {
            values.push(text_array(exclude));
        }

        ScoredPaperRow::find_by_statement(Self::statement(&sql, values))
            .all(self.conn())
            .await
            .map_err(|e| AppError::SearchIndex {
                message: format!("Full-text search failed: {}", e),
            })
    }

    /// Query relevance of specific papers; papers without a match are absent
    pub async fn score_papers(
        &self,
        query: &str,
        fields: &[String],
        paper_ids: &[String],
    ) -> Result<Vec<ScoredPaperRow>> {
        if paper_ids.is_empty() {
            return Ok(vec![]);
        }

        let vector = text_vector(fields)?;
        let sql = format!(
            r#"
            SELECT id::text AS id,
                   ts_rank_cd({vector}, plainto_tsquery('english', $1))::float8 AS score
            FROM papers
            WHERE id::text = ANY($2)
            "#
        );

        let values: Vec<Value> = vec![query.into(), text_array(paper_ids)];

        ScoredPaperRow::find_by_statement(Self::statement(&sql, values))
            .all(self.conn())
            .await
            .map_err(|e| AppError::SearchIndex {
                message: format!("Query scoring failed: {}", e),
            })
    }
}

/// An id set bound as one `text[]` parameter
fn text_array(ids: &[String]) -> Value {
    ids.to_vec().into()
}

/// An id set bound as one `int8[]` parameter
fn int_array(ids: &[i64]) -> Value {
    ids.to_vec().into()
}

/// tsvector expression over the requested `papers` columns
fn text_vector(fields: &[String]) -> Result<String> {
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        if !SEARCHABLE_FIELDS.contains(&field.as_str()) {
            return Err(AppError::Validation {
                message: format!("Field '{}' is not searchable", field),
                field: Some("search_fields".to_string()),
            });
        }
        columns.push(format!("coalesce({}, '')", field));
    }

    if columns.is_empty() {
        return Err(AppError::Validation {
            message: "At least one search field is required".to_string(),
            field: Some("search_fields".to_string()),
        });
    }

    Ok(format!("to_tsvector('english', {})", columns.join(" || ' ' || ")))
}
