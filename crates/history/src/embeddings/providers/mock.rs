//! Offline embedding provider.
//!
//! Hashes words and character trigrams into a fixed-size vector. The result
//! is deterministic and content-dependent, which is enough to exercise the
//! history pipeline without a hosted model. It has no real semantic reach:
//! paraphrases with no shared words score near zero.

use crate::embeddings::provider::EmbeddingProvider;
use recall_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "it", "its", "what",
    "how", "who",
];

/// Trigram hashing provider.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(seed).wrapping_add(b as u64));
        (hash as usize) % self.dimensions
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let weight = (*freq as f32).sqrt();

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += weight;
            }

            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[tokio::test]
    async fn test_unit_length() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("capital of France").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = MockProvider::new(384);
        let a = provider.embed("banana bread recipe").await.unwrap();
        let b = provider.embed("banana bread recipe").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = MockProvider::new(384);
        let base = provider.embed("capital city of France").await.unwrap();
        let close = provider.embed("France capital").await.unwrap();
        let far = provider.embed("banana bread recipe").await.unwrap();

        assert!(cosine_similarity(&base, &close) > cosine_similarity(&base, &far));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = MockProvider::new(16);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_non_ascii_text() {
        let provider = MockProvider::new(128);
        let embedding = provider.embed("フランスの首都はどこですか").await.unwrap();
        assert_eq!(embedding.len(), 128);
    }
}
