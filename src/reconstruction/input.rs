//! Prepared input for one reconstruction run.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File groups handed to the reconstruction engine.
///
/// Ephemeral: built by the partitioner from one output batch, consumed by
/// one engine invocation. Each inner `Vec<PathBuf>` is the artifact triple
/// of a single captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconstructionInput {
    /// Full scan: two lateral groups plus the sole group
    Paths {
        lateral_a: Vec<Vec<PathBuf>>,
        lateral_b: Vec<Vec<PathBuf>>,
        sole: Vec<Vec<PathBuf>>,
    },

    /// Sole-only rescan combined with an already reconstructed model
    Combined {
        path: PathBuf,
        sole: Vec<Vec<PathBuf>>,
    },
}

impl ReconstructionInput {
    /// Frame triples in the sole group
    pub fn sole(&self) -> &[Vec<PathBuf>] {
        match self {
            Self::Paths { sole, .. } | Self::Combined { sole, .. } => sole,
        }
    }

    /// Every distinct capture file referenced by this input, in group
    /// order. Frames shared between lateral groups appear once.
    pub fn all_files(&self) -> Vec<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();

        let groups: Vec<&[Vec<PathBuf>]> = match self {
            Self::Paths {
                lateral_a,
                lateral_b,
                sole,
            } => vec![lateral_a, lateral_b, sole],
            Self::Combined { sole, .. } => vec![sole],
        };

        for group in groups {
            for triple in group {
                for file in triple {
                    if seen.insert(file.clone()) {
                        files.push(file.clone());
                    }
                }
            }
        }

        files
    }

    /// Human-readable listing of the groups, one frame triple per line
    pub fn summary(&self) -> String {
        fn group_lines(paths: &[Vec<PathBuf>]) -> String {
            let mut result = String::new();
            for triple in paths {
                let names: Vec<String> = triple
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect();
                result.push_str(&format!("{:?}\n", names));
            }
            result
        }

        match self {
            Self::Paths {
                lateral_a,
                lateral_b,
                sole,
            } => format!(
                "lateral_a:\n{}\nlateral_b:\n{}\nsole:\n{}",
                group_lines(lateral_a),
                group_lines(lateral_b),
                group_lines(sole)
            ),
            Self::Combined { sole, .. } => format!(
                "lateral_a:\n\nlateral_b:\n\nsole:\n{}",
                group_lines(sole)
            ),
        }
    }
}
