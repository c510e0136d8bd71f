//! Static descriptive metadata for classifier labels, consulted at display time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Simple,
    Medium,
    Hard,
    Unknown,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Simple => "simple",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInfo {
    pub description: &'static str,
    pub characteristics: &'static [&'static str],
    pub difficulty: Difficulty,
}

/// Returned for any label the table does not know.
pub const DEFAULT_LABEL_INFO: LabelInfo = LabelInfo {
    description: "generic fish",
    characteristics: &["Has the basic features of a fish"],
    difficulty: Difficulty::Unknown,
};

const CATALOG: &[(&str, LabelInfo)] = &[
    (
        "Goldfish",
        LabelInfo {
            description: "A common ornamental fish, usually golden yellow",
            characteristics: &["Rounded body", "Large eyes", "Graceful fins"],
            difficulty: Difficulty::Simple,
        },
    ),
    (
        "Carp",
        LabelInfo {
            description: "A traditional East Asian fish that symbolises good luck",
            characteristics: &["Streamlined body", "Long barbels", "Large tail fin"],
            difficulty: Difficulty::Medium,
        },
    ),
    (
        "Shark",
        LabelInfo {
            description: "An apex predator of the ocean",
            characteristics: &["Triangular dorsal fin", "Sharp teeth", "Streamlined body"],
            difficulty: Difficulty::Hard,
        },
    ),
    (
        "Clownfish",
        LabelInfo {
            description: "A brightly coloured tropical fish",
            characteristics: &["Orange body", "White stripes", "Rounded shape"],
            difficulty: Difficulty::Medium,
        },
    ),
];

/// Read-only label lookup. Cheap to construct; the table itself is static.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelTable;

impl LabelTable {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, label: &str) -> &'static LabelInfo {
        CATALOG
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, info)| info)
            .unwrap_or(&DEFAULT_LABEL_INFO)
    }

    pub fn all_labels(&self) -> Vec<&'static str> {
        CATALOG.iter().map(|(name, _)| *name).collect()
    }
}
