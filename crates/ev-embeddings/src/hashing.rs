//! Deterministic feature-hashing embedder.
//!
//! Each lower-cased word (stop words removed, plural/verb suffixes trimmed)
//! and each adjacent word pair is hashed with 64-bit FNV-1a into one of
//! `dimensions` buckets with a hash-derived sign. The vector is L2-normalised,
//! so cosine similarity approximates weighted term overlap. Output depends
//! only on the input text and `dimensions`.

use crate::{Embedder, EmbeddingError};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bigrams count for less than single terms.
const BIGRAM_WEIGHT: f32 = 0.5;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "by", "for", "from", "has", "have", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "their", "this", "to", "was", "were",
    "with", "within", "all", "any", "must", "should", "shall", "place",
];

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// `dimensions` is clamped to at least 1.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimensions
    }

    /// Embed synchronously; the async trait method delegates here.
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let terms = terms(text);
        let mut vector = vec![0.0f32; self.dimensions];

        for term in &terms {
            self.accumulate(&mut vector, term.as_bytes(), 1.0);
        }
        for pair in terms.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> String {
        format!("hashing-{}", self.dimensions)
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(&w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

/// Trim a few common English suffixes so inflections share a bucket.
fn stem(word: &str) -> String {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stripped) = word.strip_suffix(suffix)
            && stripped.len() >= 3
        {
            return stripped.to_string();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed_text("Access to personal data is restricted.");
        let b = embedder.embed_text("Access to personal data is restricted.");
        assert_eq!(a, b);
        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed_text("   ");
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn related_text_scores_higher() {
        let embedder = HashingEmbedder::new(384);
        let query = embedder.embed_text("procedures to investigate personal data breaches");
        let related = embedder.embed_text("Data breach procedures are documented and tested.");
        let unrelated = embedder.embed_text("Employees receive a parking permit on arrival.");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[rstest]
    #[case("breaches", "breach")]
    #[case("documented", "document")]
    #[case("testing", "test")]
    #[case("is", "is")]
    #[case("procedures", "procedur")]
    fn stemming(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(stem(word), expected);
    }

    #[test]
    fn dimensions_clamped() {
        assert_eq!(HashingEmbedder::new(0).dimension(), 1);
    }
}
