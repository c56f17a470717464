//! Sparse TF-IDF vectors for citation-context similarity
//!
//! Tokens are lowercase runs of two or more word characters.

use litgraph_common::errors::{AppError, Result};
use regex_lite::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Sparse term -> weight vector
pub type SparseVector = HashMap<String, f64>;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "are", "around", "as", "at", "be", "became", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "done",
    "down", "due", "during", "each", "eg", "either", "else", "etc", "even", "ever", "every",
    "few", "for", "from", "further", "had", "has", "have", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "ie", "if", "in", "into", "is", "it",
    "its", "itself", "just", "least", "less", "made", "many", "may", "me", "might", "more",
    "most", "mostly", "much", "must", "my", "myself", "neither", "never", "no", "nor", "not",
    "now", "of", "off", "often", "on", "once", "one", "only", "or", "other", "others", "our",
    "ours", "ourselves", "out", "over", "own", "per", "perhaps", "rather", "same", "several",
    "she", "should", "since", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "therefore", "these", "they", "this", "those",
    "though", "through", "thus", "to", "too", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "when", "where", "whether", "which", "while",
    "who", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w\w+").expect("token pattern is valid"))
}

/// Lowercase word tokens of at least two characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Remove the `=-= ... -=-` marker that stands in for the cited reference
pub fn strip_citation_placeholder(context: &str) -> String {
    if let Some(begin) = context.find("=-=") {
        if let Some(offset) = context[begin..].find("-=-") {
            let end = begin + offset + 3;
            return format!("{}{}", &context[..begin], &context[end..]);
        }
    }
    context.to_string()
}

/// Cosine similarity; `0.0` when either vector has no mass
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();

    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

fn l2_normalize(vector: &mut SparseVector) {
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in vector.values_mut() {
            *w /= norm;
        }
    }
}

/// Document-frequency table read from a vocabulary file
#[derive(Debug, Clone, Default)]
pub struct QueryVocabulary {
    documents: f64,
    df: HashMap<String, f64>,
}

impl QueryVocabulary {
    /// Parse the vocabulary format: the corpus document count on the first
    /// line, then one `token \t document_frequency` pair per line.
    /// Malformed lines are skipped; a missing or non-positive count is a
    /// configuration error.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        let documents = lines
            .next()
            .and_then(|line| line.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite() && *n > 0.0)
            .ok_or_else(|| {
                AppError::config("context vocabulary must start with a positive document count")
            })?;

        let df = lines
            .filter_map(|line| {
                let (token, freq) = line.split_once('\t')?;
                let freq = freq.trim().parse::<f64>().ok()?;
                (freq.is_finite() && freq > 0.0).then(|| (token.trim().to_lowercase(), freq))
            })
            .collect();

        Ok(Self { documents, df })
    }

    pub fn len(&self) -> usize {
        self.df.len()
    }

    pub fn is_empty(&self) -> bool {
        self.df.is_empty()
    }

    /// `tf * ln(N / df)` for every known query token, floored at zero for
    /// tokens more frequent than the corpus size. Without a vocabulary every
    /// token is weighted by its raw count.
    pub fn query_vector(&self, query: &str) -> SparseVector {
        let mut counts: HashMap<String, f64> = HashMap::new();
        for token in tokenize(query) {
            *counts.entry(token).or_insert(0.0) += 1.0;
        }

        if self.is_empty() {
            return counts;
        }

        counts
            .into_iter()
            .filter_map(|(token, tf)| {
                let df = *self.df.get(&token)?;
                Some((token, tf * (self.documents / df).ln().max(0.0)))
            })
            .collect()
    }
}

/// Parse the `token tfidf token tfidf ...` tail of a sidecar line. Pairs
/// with a negative or non-finite value are dropped.
pub fn parse_tfidf_pairs(text: &str) -> SparseVector {
    let parts: Vec<&str> = text.split_whitespace().collect();
    parts
        .chunks_exact(2)
        .filter_map(|pair| {
            let value = pair[1].parse::<f64>().ok()?;
            (value.is_finite() && value >= 0.0).then(|| (pair[0].to_string(), value))
        })
        .collect()
}

/// Vectorizer fitted over a small batch of citation contexts
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    pub min_df: usize,
    pub max_df: f64,
    pub ngram_range: (usize, usize),
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.5,
            ngram_range: (1, 3),
        }
    }
}

impl TfidfVectorizer {
    fn analyze(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = tokenize(text).into_iter().filter(|t| !is_stop_word(t)).collect();
        let (low, high) = self.ngram_range;

        let mut terms = Vec::new();
        for n in low.max(1)..=high {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn the vocabulary and smoothed idf of `documents`
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> FittedTfidf {
        let n = documents.len();
        let mut df: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms: BTreeSet<String> = self.analyze(doc.as_ref()).into_iter().collect();
            for term in terms {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = self.max_df * n as f64;
        let idf = df
            .into_iter()
            .filter(|&(_, count)| count >= self.min_df && count as f64 <= max_count)
            .map(|(term, count)| {
                let idf = ((1.0 + n as f64) / (1.0 + count as f64)).ln() + 1.0;
                (term, idf)
            })
            .collect();

        FittedTfidf {
            vectorizer: self.clone(),
            idf,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FittedTfidf {
    vectorizer: TfidfVectorizer,
    idf: HashMap<String, f64>,
}

impl FittedTfidf {
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized `tf * idf` over the fitted vocabulary
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut vector = SparseVector::new();
        for term in self.vectorizer.analyze(text) {
            if let Some(idf) = self.idf.get(&term) {
                *vector.entry(term).or_insert(0.0) += idf;
            }
        }
        l2_normalize(&mut vector);
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f64)]) -> SparseVector {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Graph-based Ranking, a B-tree!"),
            vec!["graph", "based", "ranking", "tree"]
        );
    }

    #[test]
    fn test_strip_placeholder() {
        assert_eq!(
            strip_citation_placeholder("as shown in =-=smith99-=- for graphs"),
            "as shown in  for graphs"
        );
        assert_eq!(strip_citation_placeholder("no marker"), "no marker");
        assert_eq!(strip_citation_placeholder("open =-= only"), "open =-= only");
    }

    #[test]
    fn test_cosine() {
        let a = vector(&[("graph", 1.0), ("rank", 1.0)]);
        let b = vector(&[("graph", 2.0), ("rank", 2.0)]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);

        let c = vector(&[("tree", 1.0)]);
        assert_eq!(cosine_similarity(&a, &c), 0.0);
        assert_eq!(cosine_similarity(&a, &SparseVector::new()), 0.0);
    }

    #[test]
    fn test_vocabulary_query_vector() {
        let vocab = QueryVocabulary::parse("100\ngraph\t10\nranking\t100\nbad line\n").unwrap();
        assert_eq!(vocab.len(), 2);

        let q = vocab.query_vector("graph graph ranking unknown");
        assert!((q["graph"] - 2.0 * (10.0_f64).ln()).abs() < 1e-12);
        assert_eq!(q["ranking"], 0.0);
        assert!(!q.contains_key("unknown"));
    }

    #[test]
    fn test_vocabulary_rejects_bad_document_count() {
        assert!(QueryVocabulary::parse("0\ngraph\t20\n").is_err());
        assert!(QueryVocabulary::parse("-3\ngraph\t2\n").is_err());
        assert!(QueryVocabulary::parse("graph\t2\n").is_err());
        assert!(QueryVocabulary::parse("").is_err());
    }

    #[test]
    fn test_overfrequent_tokens_weigh_zero() {
        let vocab = QueryVocabulary::parse("10\ngraph\t20\nranking\t2\n").unwrap();
        let q = vocab.query_vector("graph ranking");
        assert_eq!(q["graph"], 0.0);
        assert!(q["ranking"] > 0.0);
        assert!(q.values().all(|w| w.is_finite() && *w >= 0.0));
    }

    #[test]
    fn test_query_vector_without_vocabulary() {
        let q = QueryVocabulary::default().query_vector("graph graph ranking");
        assert_eq!(q["graph"], 2.0);
        assert_eq!(q["ranking"], 1.0);
    }

    #[test]
    fn test_parse_pairs() {
        let v = parse_tfidf_pairs("graph 0.5 ranking 0.25 broken x dangling");
        assert_eq!(v.len(), 2);
        assert_eq!(v["graph"], 0.5);
        assert_eq!(v["ranking"], 0.25);

        let v = parse_tfidf_pairs("graph -0.5 ranking NaN tree inf rank 0.1");
        assert_eq!(v.len(), 1);
        assert_eq!(v["rank"], 0.1);
    }

    #[test]
    fn test_vectorizer_document_frequency_bounds() {
        let docs = [
            "citation graph ranking",
            "citation graph search",
            "neural ranking models",
            "protein folding",
            "protein structure",
        ];
        let fitted = TfidfVectorizer::default().fit(&docs);

        // df 2 of 5 passes both bounds; df 1 fails min_df
        let v = fitted.transform("citation graph");
        assert!(v.contains_key("citation"));
        assert!(v.contains_key("citation graph"));
        assert!(!fitted.transform("neural").contains_key("neural"));

        let norm: f64 = v.values().map(|w| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vectorizer_empty_corpus() {
        let docs: [&str; 0] = [];
        let fitted = TfidfVectorizer::default().fit(&docs);
        assert_eq!(fitted.vocabulary_len(), 0);
        assert!(fitted.transform("anything").is_empty());
    }
}
