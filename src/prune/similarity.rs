//! Similarity backends.
//!
//! Scoring only needs `similarity(query, text) -> f32`, higher meaning more
//! relevant. Two backends ship with the crate: a dependency-free lexical
//! overlap score and an adapter that turns any text embedder into cosine
//! similarity.

use std::sync::Mutex;

use thiserror::Error;

/// Failure of a similarity call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    /// Worth retrying: rate limits, unavailable service, network trouble.
    #[error("transient similarity failure: {0}")]
    Transient(String),

    /// Retrying cannot help: rejected request, bad input.
    #[error("similarity request rejected: {0}")]
    Permanent(String),
}

/// Relevance of `text` to `query`.
///
/// Implementations must return the same score for the same inputs.
pub trait Similarity {
    fn similarity(&self, query: &str, text: &str) -> Result<f32, SimilarityError>;
}

impl<S: Similarity + ?Sized> Similarity for &S {
    fn similarity(&self, query: &str, text: &str) -> Result<f32, SimilarityError> {
        (**self).similarity(query, text)
    }
}

/// Share of the query's distinct tokens that also occur in the text.
///
/// Tokens are lowercase ASCII alphanumeric runs of at least two characters.
/// Scores fall in `[0, 1]`; an empty query scores 0 everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl Similarity for LexicalSimilarity {
    fn similarity(&self, query: &str, text: &str) -> Result<f32, SimilarityError> {
        Ok(overlap_score(&tokenize(query), &tokenize(text)))
    }
}

fn tokenize(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for ch in s.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            cur.push(c);
        } else if !cur.is_empty() {
            if cur.len() >= 2 {
                out.push(std::mem::take(&mut cur));
            }
            cur.clear();
        }
    }
    if cur.len() >= 2 {
        out.push(cur);
    }
    out.sort();
    out.dedup();
    out
}

/// Both slices sorted and deduplicated.
fn overlap_score(query_toks: &[String], text_toks: &[String]) -> f32 {
    if query_toks.is_empty() || text_toks.is_empty() {
        return 0.0;
    }
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < query_toks.len() && j < text_toks.len() {
        match query_toks[i].cmp(&text_toks[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared as f32 / query_toks.len() as f32
}

/// Text embedding model.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, SimilarityError>;
}

/// Cosine similarity between embeddings.
///
/// The query embedding is cached: scoring a tree asks about one query many
/// times in a row.
pub struct EmbeddingSimilarity<E> {
    embedder: E,
    query_cache: Mutex<Option<(String, Vec<f32>)>>,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            query_cache: Mutex::new(None),
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    fn query_embedding(&self, query: &str) -> Result<Vec<f32>, SimilarityError> {
        if let Ok(cache) = self.query_cache.lock()
            && let Some((cached_query, embedding)) = cache.as_ref()
            && cached_query == query
        {
            return Ok(embedding.clone());
        }
        let embedding = self.embedder.embed(query)?;
        if let Ok(mut cache) = self.query_cache.lock() {
            *cache = Some((query.to_string(), embedding.clone()));
        }
        Ok(embedding)
    }
}

impl<E: Embedder> Similarity for EmbeddingSimilarity<E> {
    fn similarity(&self, query: &str, text: &str) -> Result<f32, SimilarityError> {
        let query_vec = self.query_embedding(query)?;
        let text_vec = self.embedder.embed(text)?;
        cosine(&query_vec, &text_vec)
    }
}

/// Cosine similarity; 0 when either vector has zero length.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::Permanent(format!(
            "embedding dimensions differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
