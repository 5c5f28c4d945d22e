use serde::{Deserialize, Serialize};

/// Per-variation side channel collected during expansion and the deferred pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Labels in the order they were encountered, used in output filenames
    pub labels: Vec<String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            labels: vec![label.into()],
        }
    }

    pub fn add_label(&mut self, label: Option<&str>) {
        if let Some(label) = label {
            self.labels.push(label.to_string());
        }
    }

    /// Append another metadata's labels after this one's
    pub fn extend(&mut self, other: Metadata) {
        self.labels.extend(other.labels);
    }
}
