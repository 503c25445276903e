//! Word-vector table for the similarity fallback
//!
//! Loaded once at startup from a GloVe-style text file (`word v1 v2 ...` per
//! line) and shared by reference. An empty table answers every similarity
//! query with `None`.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Fragments shorter than this are not looked up
const MIN_FRAGMENT_LEN: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl WordVectors {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from in-memory entries; every vector must share one dimension
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut table = Self::empty();
        for (word, vector) in entries {
            table.insert(word.into(), vector)?;
        }
        Ok(table)
    }

    /// Load a GloVe text file. Lines with a mismatched dimension fail the load.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open word vectors: {}", path.display()))?;

        let mut table = Self::empty();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            let vector = fields
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<f32>, _>>()
                .with_context(|| format!("Invalid vector on line {} of {}", line_num + 1, path.display()))?;
            table
                .insert(word.to_string(), vector)
                .with_context(|| format!("Line {} of {}", line_num + 1, path.display()))?;
        }

        info!("Loaded {} word vectors ({} dimensions)", table.len(), table.dimensions);
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine similarity of two words, `None` when either is missing
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        let va = self.vectors.get(&a.to_lowercase())?;
        let vb = self.vectors.get(&b.to_lowercase())?;
        cosine(va, vb)
    }

    /// Highest similarity between any fragment of `domain` (split on `.` and
    /// `-`, fragments under three characters ignored) and any keyword.
    /// Missing words contribute nothing; the floor is 0.0.
    pub fn max_similarity(&self, domain: &str, keywords: &[&str]) -> f32 {
        let mut best = 0.0_f32;
        for fragment in domain.split(['.', '-']) {
            if fragment.chars().count() < MIN_FRAGMENT_LEN {
                continue;
            }
            for keyword in keywords {
                if let Some(sim) = self.similarity(fragment, keyword) {
                    best = best.max(sim);
                }
            }
        }
        debug!("Max embedding similarity for {}: {:.3}", domain, best);
        best
    }

    fn insert(&mut self, word: String, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            bail!("Empty vector for '{}'", word);
        }
        if self.dimensions == 0 {
            self.dimensions = vector.len();
        } else if vector.len() != self.dimensions {
            bail!(
                "Vector for '{}' has {} dimensions, expected {}",
                word,
                vector.len(),
                self.dimensions
            );
        }
        self.vectors.insert(word.to_lowercase(), vector);
        Ok(())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}
