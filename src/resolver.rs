// Seam to the external coreference-resolution collaborator. The engine
// consumes the resolver's output contract only; mention detection,
// clustering, and model lifecycle live on the other side of this trait.

use anyhow::{ensure, Result};

use crate::replacer::Cluster;

/// A stateless coreference-resolution collaborator.
///
/// Implementations take a batch of paragraphs (each an ordered sentence
/// list) and report one cluster set per paragraph, parallel to the input.
/// Mention offsets are character offsets over the concatenation of the
/// paragraph's sentences, the space [`crate::replacer::joined_text`]
/// produces.
pub trait CoreferenceResolver {
    fn resolve(&self, paragraphs: &[Vec<String>]) -> Result<Vec<Vec<Cluster>>>;
}

/// Replays cluster sets produced offline, one per paragraph in order.
///
/// The batch pipeline consumes resolver output shipped inside its input
/// records; this adapter turns those stored clusters back into a
/// [`CoreferenceResolver`] for the batch driver.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedClusters {
    cluster_sets: Vec<Vec<Cluster>>,
}

impl PrecomputedClusters {
    pub fn new(cluster_sets: Vec<Vec<Cluster>>) -> Self {
        Self { cluster_sets }
    }
}

impl CoreferenceResolver for PrecomputedClusters {
    fn resolve(&self, paragraphs: &[Vec<String>]) -> Result<Vec<Vec<Cluster>>> {
        ensure!(
            paragraphs.len() == self.cluster_sets.len(),
            "have {} precomputed cluster sets for {} paragraphs",
            self.cluster_sets.len(),
            paragraphs.len()
        );
        Ok(self.cluster_sets.clone())
    }
}
