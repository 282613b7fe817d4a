//! Deterministic token-hash embeddings
//!
//! Documents and queries are mapped into a fixed-dimension vector space by
//! hashing normalised tokens (feature hashing). The result is stable across
//! processes and Rust releases, so nothing needs to be persisted besides the
//! document text.

use tracing::debug;

/// Dimension of the default embedding space
pub const EMBEDDING_DIM: usize = 1024;

/// Tokens too common to carry any signal for lookup
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in", "is", "it", "much",
    "of", "on", "or", "should", "than", "that", "the", "to", "what", "when", "which", "with",
];

/// Maps text to a vector; similar text must map to nearby vectors
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Feature-hashing embedder over normalised word tokens
#[derive(Debug, Clone)]
pub struct TokenHashEmbedder {
    dim: usize,
}

impl TokenHashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Default for TokenHashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl Embedder for TokenHashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let tokens = tokenize(text);
        debug!(token_count = tokens.len(), "TokenHashEmbedder::embed: called");

        for token in tokens {
            let h = fnv1a64(&token);
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }
}

/// Split text into lower-cased, plural-folded tokens with stop-words removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .map(|t| fold_plural(&t))
        .collect()
}

/// Naive plural folding: "tomatoes" -> "tomato", "seedlings" -> "seedling"
fn fold_plural(token: &str) -> String {
    if token.len() > 4
        && let Some(stem) = token.strip_suffix("oes")
    {
        return format!("{}o", stem);
    }
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

fn fnv1a64(s: &str) -> u64 {
    let mut h: u64 = 14695981039346656037;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(1099511628211);
    }
    h
}

/// Cosine distance between two L2-normalised vectors (0.0 = identical direction)
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot
}
