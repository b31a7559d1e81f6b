// ============================================================
// Layer 3 — Class Vocabulary
// ============================================================
// The ordered list of class names. Label index i always means
// names[i]; the same vocabulary is shared by every split and
// stored alongside each checkpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassVocabulary {
    names: Vec<String>,
}

impl ClassVocabulary {
    /// Build a vocabulary from class names. Names are sorted so the
    /// order never depends on filesystem iteration order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}
