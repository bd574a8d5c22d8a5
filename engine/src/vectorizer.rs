use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::VectorizerConfig;
use crate::tokenizer::terms;
use crate::TermId;

/// Sparse vector over the vocabulary, entries sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool { self.entries.iter().all(|(_, w)| *w == 0.0) }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
        let (a, b) = (&self.entries, &other.entries);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

    /// Dense view of length `dim`.
    pub fn to_dense(&self, dim: usize) -> Vec<f32> {
        let mut out = vec![0.0; dim];
        for (tid, w) in &self.entries {
            if let Some(slot) = out.get_mut(*tid as usize) { *slot = *w; }
        }
        out
    }
}

/// Cosine similarity, 0 when either side has zero norm, clamped to [0, 1].
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let (na, nb) = (a.norm(), b.norm());
    if na == 0.0 || nb == 0.0 { return 0.0; }
    let sim = a.dot(b) / (na * nb);
    if sim.is_nan() { 0.0 } else { sim.clamp(0.0, 1.0) }
}

/// Fitted vocabulary and IDF weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    pub config: VectorizerConfig,
    pub dictionary: HashMap<String, TermId>,
    pub idf: Vec<f32>,
}

impl TfIdfVectorizer {
    /// Fit vocabulary and IDF over the corpus texts.
    pub fn fit<S: AsRef<str>>(texts: &[S], config: VectorizerConfig) -> Self {
        let n = texts.len();
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut total: HashMap<String, u64> = HashMap::new();
        for text in texts {
            let doc_terms = terms(text.as_ref(), config.ngram_range);
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &doc_terms {
                *total.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let max_docs = config.max_df * n as f64;
        let mut kept: Vec<(String, u64)> = total
            .into_iter()
            .filter(|(term, _)| {
                let d = df[term] as f64;
                d >= config.min_df as f64 && d <= max_docs
            })
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(config.max_features);

        // Columns are assigned in alphabetical term order.
        let ordered: BTreeMap<String, u32> = kept
            .into_iter()
            .map(|(term, _)| {
                let d = df[&term];
                (term, d)
            })
            .collect();
        let mut dictionary = HashMap::with_capacity(ordered.len());
        let mut idf = Vec::with_capacity(ordered.len());
        for (tid, (term, d)) in ordered.into_iter().enumerate() {
            idf.push((((1 + n) as f32) / ((1 + d) as f32)).ln() + 1.0);
            dictionary.insert(term, tid as TermId);
        }
        tracing::debug!(num_docs = n, vocabulary = dictionary.len(), "fitted vectorizer");
        Self { config, dictionary, idf }
    }

    pub fn vocabulary_size(&self) -> usize { self.idf.len() }

    /// Weighted, L2-normalized vector for `text`. Out-of-vocabulary terms are
    /// dropped; text without vocabulary terms maps to the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in terms(text, self.config.ngram_range) {
            if let Some(&tid) = self.dictionary.get(&term) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(TermId, f32)> = tf
            .into_iter()
            .map(|(tid, count)| (tid, count as f32 * self.idf[tid as usize]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() { *w /= norm; }
        }
        SparseVector { entries }
    }
}
