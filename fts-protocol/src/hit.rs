//! The ranked hit type shared by adapters and the query engine.

use serde::{Deserialize, Serialize};

/// A single ranked search hit.
///
/// # Invariants
///
/// - `score` is finite and non-negative; [`SearchHit::new`] clamps anything
///   else to `0.0`.
/// - `snippet` is empty when the endpoint returned none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier token exactly as returned by the endpoint.
    pub id: String,

    /// Relevance score (higher is more relevant).
    pub score: f64,

    /// Highlight or snippet text.
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    /// Create a new hit, clamping the score to a finite non-negative value.
    pub fn new(id: impl Into<String>, score: f64, snippet: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score: sanitize_score(score),
            snippet: snippet.into(),
        }
    }

    /// Replace the snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}
